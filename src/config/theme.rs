use crate::config::WidgetConfig;

const PRIMARY_DARKEN_AMOUNT: u8 = 15;

pub fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

fn expand_hex(value: &str) -> Option<[u8; 3]> {
    if !is_hex_color(value) {
        return None;
    }
    let hex = &value[1..];
    let full: String = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };
    let channel = |i: usize| u8::from_str_radix(&full[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Subtracts `amount` from each channel, saturating at zero. Values that
/// are not hex colors come back unchanged.
pub fn darken_hex(value: &str, amount: u8) -> String {
    match expand_hex(value) {
        Some([r, g, b]) => {
            format!(
                "#{:02x}{:02x}{:02x}",
                r.saturating_sub(amount),
                g.saturating_sub(amount),
                b.saturating_sub(amount)
            )
        }
        None => value.to_string(),
    }
}

/// CSS custom properties the widget stylesheet reads.
pub fn css_variables(config: &WidgetConfig) -> Vec<(&'static str, String)> {
    vec![
        ("--chatbot-primary-color", config.primary_color.clone()),
        ("--chatbot-primary-dark", darken_hex(&config.primary_color, PRIMARY_DARKEN_AMOUNT)),
        ("--chatbot-secondary-color", config.secondary_color.clone()),
        ("--chatbot-text-color", config.text_color.clone()),
        ("--chatbot-bot-text-color", config.bot_text_color.clone()),
        ("--chatbot-user-text-color", config.user_text_color.clone()),
        ("--chatbot-button-size", format!("{}px", config.button_size.px()))
    ]
}

pub fn position_class(config: &WidgetConfig) -> String {
    format!("chatbot-quaxar-position-{}", config.button_position.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ ButtonPosition, ButtonSize };

    #[test]
    fn darkens_primary() {
        assert_eq!(darken_hex("#0066CC", 15), "#0057bd");
        assert_eq!(darken_hex("#fff", 15), "#f0f0f0");
        assert_eq!(darken_hex("#050505", 15), "#000000");
        assert_eq!(darken_hex("blue", 15), "blue");
    }

    #[test]
    fn recognises_hex_colors() {
        assert!(is_hex_color("#1f2937"));
        assert!(is_hex_color("#FFF"));
        assert!(!is_hex_color("1f2937"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#ggg"));
    }

    #[test]
    fn builds_variables_and_position() {
        let config = WidgetConfig {
            button_size: ButtonSize::Small,
            button_position: ButtonPosition::BottomLeft,
            ..WidgetConfig::default()
        };
        let vars = css_variables(&config);
        assert!(vars.contains(&("--chatbot-primary-dark", "#0057bd".to_string())));
        assert!(vars.contains(&("--chatbot-button-size", "50px".to_string())));
        assert_eq!(position_class(&config), "chatbot-quaxar-position-bottom-left");
    }
}
