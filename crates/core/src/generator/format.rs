use once_cell::sync::Lazy;

/// Text layout shared by every generated file. Resolved once per process.
pub struct CodeFormat {
    pub line_break: &'static str,
    pub two_lines: String,
    pub banner: String,
}

pub static FORMAT: Lazy<CodeFormat> = Lazy::new(|| {
    let lb = if cfg!(windows) { "\r\n" } else { "\n" };
    let banner = [
        "/*",
        "    The code in this file uses open source libraries provided by thecoderscorner",
        "",
        "    DO NOT EDIT THIS FILE, IT WILL BE GENERATED EVERY TIME YOU USE THE UI DESIGNER",
        "    INSTEAD EITHER PUT CODE IN YOUR SKETCH OR CREATE ANOTHER SOURCE FILE.",
        "",
        "    All the variables you may need access to are marked extern in this file for easy",
        "    use elsewhere.",
        " */",
        "",
        "",
    ]
    .join(lb);
    CodeFormat {
        line_break: lb,
        two_lines: format!("{lb}{lb}"),
        banner,
    }
});

pub const HEADER_GUARD: &str = "MENU_GENERATED_CODE_H";

/// Runtime library header included first by every generated source file.
pub const RUNTIME_HEADER: &str = "tcMenu.h";

/// Token for a missing link or an unnamed item.
pub const NULL_NAME: &str = "NULL";

pub const NO_CALLBACK: &str = "NO_CALLBACK";
