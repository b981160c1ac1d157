//! Entry point adjustments: make sure the sketch includes the generated header,
//! calls `setupMenu()`, runs the task manager and defines every callback.

use regex::Regex;
use std::{collections::HashSet, fs, io, path::Path, sync::Arc};

use crate::CoreLog;
use crate::generator::{callbacks::CallbackRequirement, format::FORMAT};

pub trait SketchAdjuster: Send + Sync {
    fn make_adjustments(
        &self,
        logger: &Arc<dyn CoreLog>,
        path: &Path,
        project_name: &str,
        callbacks: &[&CallbackRequirement],
    ) -> io::Result<()>;
}

#[derive(Default)]
pub struct ArduinoSketchAdjuster;

impl ArduinoSketchAdjuster {
    pub fn new() -> Self {
        Self
    }

    /// Returns the adjusted text, or `None` when nothing had to change.
    pub fn adjust_text(
        &self,
        original: &str,
        project_name: &str,
        callbacks: &[&CallbackRequirement],
    ) -> Option<String> {
        let include = format!("#include \"{project_name}_menu.h\"");
        let mut lines: Vec<String> = original.lines().map(str::to_string).collect();
        let mut changed = false;

        if !lines.iter().any(|l| l.trim() == include) {
            lines.insert(0, include);
            changed = true;
        }

        let setup = lines.iter().position(|l| is_function_start(l, "setup"));
        match setup {
            Some(ix) => {
                if !lines.iter().any(|l| l.trim() == "setupMenu();") {
                    // the body opens on the signature line or a later one
                    let open = lines[ix..]
                        .iter()
                        .position(|l| l.contains('{'))
                        .map_or(ix, |o| ix + o);
                    lines.insert(open + 1, "    setupMenu();".to_string());
                    changed = true;
                }
            }
            None => {
                lines.extend(
                    ["", "void setup() {", "    setupMenu();", "}"].map(str::to_string),
                );
                changed = true;
            }
        }

        if !lines.iter().any(|l| is_function_start(l, "loop")) {
            lines.extend(
                ["", "void loop() {", "    taskManager.runLoop();", "}"].map(str::to_string),
            );
            changed = true;
        }

        let body = lines.join("\n");
        let mut stubbed: HashSet<&str> = HashSet::new();
        for cb in callbacks.iter().filter(|c| c.needs_user_function()) {
            // several items may share one function
            if !stubbed.insert(cb.symbol.as_str()) {
                continue;
            }
            let defined = Regex::new(&format!(r"\b{}\s*\(", regex::escape(&cb.symbol)))
                .map(|re| re.is_match(&body))
                .unwrap_or(false);
            if !defined {
                lines.push(String::new());
                lines.extend(stub_for(cb));
                changed = true;
            }
        }

        if !changed {
            return None;
        }
        let lb = FORMAT.line_break;
        Some(lines.join(lb) + lb)
    }
}

fn is_function_start(line: &str, name: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("void ") && t[5..].trim_start().starts_with(&format!("{name}("))
}

fn stub_for(cb: &CallbackRequirement) -> Vec<String> {
    let signature = cb.header.trim_end_matches(';');
    let body = if cb.header.starts_with("int ") {
        "    return defaultRtListCallback(item, row, mode, buffer, bufferSize);"
    } else {
        "    // TODO - your menu change code"
    };
    vec![format!("{signature} {{"), body.to_string(), "}".to_string()]
}

impl SketchAdjuster for ArduinoSketchAdjuster {
    fn make_adjustments(
        &self,
        logger: &Arc<dyn CoreLog>,
        path: &Path,
        project_name: &str,
        callbacks: &[&CallbackRequirement],
    ) -> io::Result<()> {
        let original = if path.is_file() {
            fs::read_to_string(path)?
        } else {
            logger.info(&format!("Creating new entry point {}", path.display()));
            String::new()
        };

        match self.adjust_text(&original, project_name, callbacks) {
            Some(updated) => {
                logger.info(&format!("Updating {}", path.display()));
                fs::write(path, updated)
            }
            None => {
                logger.info("No changes needed in the entry point file");
                Ok(())
            }
        }
    }
}
