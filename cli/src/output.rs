use colored::Colorize;
use serde::Serialize;

pub fn header(title: &str) {
    println!("{}", title.bold().underline());
}

pub fn subheader(title: &str) {
    println!("{}", title.bold());
}

pub fn hint(msg: &str) {
    println!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One `key: value` line, aligned for a block of similar lines.
pub fn field(name: &str, value: &str) {
    println!("  {:<14} {}", format!("{name}:"), value.cyan());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printers_do_not_panic() {
        header("Header");
        subheader("Subheader");
        hint("a hint");
        warn("a warning");
        success("done");
        field("strategy", "direct");
    }

    #[test]
    fn test_json_accepts_unsized() {
        let items: &[u32] = &[1, 2];
        json(items).unwrap();
    }
}
