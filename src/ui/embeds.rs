use serenity::builder::CreateEmbed;

use crate::bot::commands::{CommandSpec, MUSIC_COMMANDS};

/// Colour palette for the bot's embeds.
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
}

/// Overview embed listing the music command group.
pub fn help_overview(prefix: &str) -> CreateEmbed {
    let command_list = MUSIC_COMMANDS
        .iter()
        .map(|spec| format!("`{}`", spec.name))
        .collect::<Vec<_>>()
        .join(" | ");

    CreateEmbed::default()
        .title("🤖 รายการคำสั่งทั้งหมด")
        .description(format!(
            "พิมพ์ `{prefix}help ชื่อคำสั่ง` เพื่อดูรายละเอียดเพิ่มเติมของคำสั่งนั้น เช่น `{prefix}help play`"
        ))
        .color(colors::SUCCESS_GREEN)
        .field("📦 Music", command_list, false)
}

/// Detail embed for a single command.
pub fn command_help(spec: &CommandSpec) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("🆘 วิธีใช้คำสั่ง `{}`", spec.name))
        .color(colors::INFO_BLUE)
        .field("คำอธิบาย", spec.help.unwrap_or("ไม่มีคำอธิบาย"), false)
}
