//! The `visionforge providers` command: list provider presets.

use visionforge_core::ProviderKind;

/// Print one line per provider kind with its protocol and defaults.
pub async fn execute() -> anyhow::Result<()> {
    for line in preset_lines() {
        println!("{line}");
    }
    Ok(())
}

fn preset_lines() -> Vec<String> {
    let mut lines = vec![format!(
        "{:<10} {:<36} {:<10} {:<28} {}",
        "KIND", "LABEL", "PROTOCOL", "DEFAULT MODEL", "KEY ENV VAR"
    )];
    for kind in ProviderKind::ALL {
        let preset = kind.preset();
        let protocol = if kind.uses_structured_schema() {
            "schema"
        } else {
            "chat"
        };
        let model = if preset.default_model.is_empty() {
            "-"
        } else {
            preset.default_model
        };
        lines.push(format!(
            "{:<10} {:<36} {:<10} {:<28} {}",
            kind.as_str(),
            preset.label,
            protocol,
            model,
            preset.api_key_env
        ));
        if let Some(url) = preset.default_base_url {
            lines.push(format!("{:<10} {url}", ""));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_every_kind() {
        let lines = preset_lines();
        for kind in ProviderKind::ALL {
            assert!(
                lines.iter().any(|l| l.starts_with(kind.as_str())),
                "missing {kind}"
            );
        }
        let google = lines.iter().find(|l| l.starts_with("google")).unwrap();
        assert!(google.contains("schema"));
        assert!(google.contains("GEMINI_API_KEY"));
        let custom = lines.iter().find(|l| l.starts_with("custom")).unwrap();
        assert!(custom.contains("chat"));
    }
}
