//! Theme colors, with optional hex overrides from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;

/// Theme colors for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,      // Active borders, links, key hints
    pub danger: Color,      // Errors, severe side effects
    pub warning: Color,     // Loading state, moderate side effects
    pub success: Color,     // Prices, answers
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Labels, source lines, mild side effects
    pub inactive: Color,    // Borders of unfocused boxes
    pub header: Color,      // Card titles
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(137, 180, 250),
            danger: Color::Rgb(243, 139, 168),
            warning: Color::Rgb(250, 179, 135),
            success: Color::Rgb(166, 218, 149),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(245, 194, 231),
        }
    }
}

impl Theme {
    /// Defaults with any valid overrides from config applied
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let overrides = [
            (&config.accent, &mut theme.accent),
            (&config.danger, &mut theme.danger),
            (&config.warning, &mut theme.warning),
            (&config.success, &mut theme.success),
            (&config.text, &mut theme.text),
            (&config.text_dim, &mut theme.text_dim),
        ];

        for (value, slot) in overrides {
            if let Some(value) = value {
                match Self::parse_hex_color(value) {
                    Some(color) => *slot = color,
                    None => tracing::warn!("Ignoring invalid theme color: {}", value),
                }
            }
        }

        theme
    }

    /// Color for a side-effect severity label
    pub fn severity_color(&self, severity: &str) -> Color {
        let severity = severity.to_lowercase();
        if severity.contains("severe") || severity.contains("high") {
            self.danger
        } else if severity.contains("moderate") || severity.contains("medium") {
            self.warning
        } else {
            self.text_dim
        }
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');

        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}
