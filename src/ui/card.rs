//! Drug cards.
//!
//! A [`DrugCard`] is a plain list of what to show for one drug. It is built
//! without touching the terminal, then drawn either as ratatui lines or as
//! plain text for one-shot output.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::drug::{DrugBundle, DrugInfo, SideEffect};
use crate::theme::Theme;

#[derive(Debug, Clone, PartialEq)]
pub enum CardElement {
    Name(String),
    Company(String),
    Price(String),
    Quantity(String),
    Dosage(String),
    Description(String),
    Retailer { name: String, url: Option<String> },
    SideEffects(Vec<SideEffect>),
    Source(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrugCard {
    pub title: String,
    pub elements: Vec<CardElement>,
}

/// Price with two decimals, e.g. `$4.50`
pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

/// OSC 8 terminal hyperlink
pub fn hyperlink(url: &str, text: &str) -> String {
    format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
}

/// Cards for a bundle, in display order: brand, generic, then each alternative
pub fn bundle_cards(bundle: &DrugBundle) -> Vec<DrugCard> {
    let mut cards = vec![DrugCard::new("Brand", &bundle.brand)];

    if let Some(generic) = &bundle.generic {
        cards.push(DrugCard::new("Generic", generic));
    }

    cards.extend(
        bundle
            .alternatives
            .iter()
            .enumerate()
            .map(|(i, alt)| DrugCard::new(format!("Alternative {}", i + 1), alt)),
    );

    cards
}

impl DrugCard {
    pub fn new(title: impl Into<String>, drug: &DrugInfo) -> Self {
        let mut elements = vec![CardElement::Name(drug.name.clone())];

        if let Some(company) = &drug.company {
            elements.push(CardElement::Company(company.clone()));
        }

        elements.push(CardElement::Price(format_price(drug.price)));
        elements.push(CardElement::Quantity(drug.quantity.clone()));
        elements.push(CardElement::Dosage(drug.dosage.clone()));

        if !drug.description.is_empty() {
            elements.push(CardElement::Description(drug.description.clone()));
        }

        if let Some(retailer) = &drug.retailer {
            elements.push(CardElement::Retailer {
                name: retailer.name.clone(),
                url: retailer.url.clone(),
            });
        }

        if !drug.side_effects.is_empty() {
            elements.push(CardElement::SideEffects(drug.side_effects.clone()));
        }

        elements.push(CardElement::Source(drug.source.clone()));

        Self {
            title: title.into(),
            elements,
        }
    }

    /// Rendered lines, without the surrounding border
    pub fn lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let label = Style::default().fg(theme.text_dim);
        let value = Style::default().fg(theme.text);
        let mut lines = Vec::new();

        for element in &self.elements {
            match element {
                CardElement::Name(name) => lines.push(Line::styled(
                    name.clone(),
                    Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
                )),
                CardElement::Company(company) => lines.push(Line::from(vec![
                    Span::styled("Company: ", label),
                    Span::styled(company.clone(), value),
                ])),
                CardElement::Price(price) => lines.push(Line::from(vec![
                    Span::styled("Price: ", label),
                    Span::styled(price.clone(), Style::default().fg(theme.success)),
                ])),
                CardElement::Quantity(quantity) => lines.push(Line::from(vec![
                    Span::styled("Quantity: ", label),
                    Span::styled(quantity.clone(), value),
                ])),
                CardElement::Dosage(dosage) => lines.push(Line::from(vec![
                    Span::styled("Dosage: ", label),
                    Span::styled(dosage.clone(), value),
                ])),
                CardElement::Description(description) => {
                    lines.push(Line::styled(description.clone(), value))
                }
                CardElement::Retailer { name, url } => {
                    let mut spans = vec![Span::styled("Available at: ", label)];
                    match url {
                        Some(url) => {
                            spans.push(Span::styled(
                                name.clone(),
                                Style::default()
                                    .fg(theme.accent)
                                    .add_modifier(Modifier::UNDERLINED),
                            ));
                            spans.push(Span::styled(format!(" <{}>", url), label));
                        }
                        None => spans.push(Span::styled(name.clone(), value)),
                    }
                    lines.push(Line::from(spans));
                }
                CardElement::SideEffects(effects) => {
                    lines.push(Line::styled(
                        "Side Effects:",
                        Style::default().fg(theme.header).add_modifier(Modifier::BOLD),
                    ));
                    for effect in effects {
                        lines.push(Line::from(vec![
                            Span::styled("  • ", label),
                            Span::styled(effect.name.clone(), value),
                            Span::styled(
                                format!(" ({})", effect.severity),
                                Style::default().fg(theme.severity_color(&effect.severity)),
                            ),
                        ]));
                    }
                }
                CardElement::Source(source) => {
                    lines.push(Line::styled(format!("Source: {}", source), label))
                }
            }
        }

        lines
    }

    /// Card body wrapped to whatever width it is drawn at
    pub fn paragraph(&self, theme: &Theme) -> Paragraph<'static> {
        Paragraph::new(self.lines(theme)).wrap(Wrap { trim: false })
    }

    /// Rows needed at `width` columns, counting wrapped lines and the border
    pub fn height(&self, theme: &Theme, width: u16) -> u16 {
        let inner = width.saturating_sub(2).max(1);
        let rows = self.paragraph(theme).line_count(inner);
        (rows + 2).min(u16::MAX as usize) as u16
    }

    /// Plain-text rendering for non-interactive output
    pub fn to_plain(&self) -> String {
        let mut out = vec![format!("── {} ──", self.title)];

        for element in &self.elements {
            match element {
                CardElement::Name(name) => out.push(name.clone()),
                CardElement::Company(company) => out.push(format!("Company: {}", company)),
                CardElement::Price(price) => out.push(format!("Price: {}", price)),
                CardElement::Quantity(quantity) => out.push(format!("Quantity: {}", quantity)),
                CardElement::Dosage(dosage) => out.push(format!("Dosage: {}", dosage)),
                CardElement::Description(description) => out.push(description.clone()),
                CardElement::Retailer { name, url: Some(url) } => {
                    out.push(format!("Available at: {}", hyperlink(url, name)))
                }
                CardElement::Retailer { name, url: None } => {
                    out.push(format!("Available at: {}", name))
                }
                CardElement::SideEffects(effects) => {
                    out.push("Side Effects:".to_string());
                    out.extend(
                        effects
                            .iter()
                            .map(|e| format!("  - {} ({})", e.name, e.severity)),
                    );
                }
                CardElement::Source(source) => out.push(format!("Source: {}", source)),
            }
        }

        out.join("\n")
    }
}
