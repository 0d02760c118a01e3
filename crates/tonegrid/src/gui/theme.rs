use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgba;

pub struct ThemeColors {
    pub background: Srgba<f64>,
    pub lines: Srgba<f64>,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            background: Srgba::new(1.0, 1.0, 1.0, 1.0),
            lines: Srgba::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

impl ThemeColors {
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        let fallback = Self::default();
        Self {
            background: Self::lookup_color(context, "theme_base_color", fallback.background),
            lines: Self::lookup_color(context, "theme_fg_color", fallback.lines),
        }
    }

    fn lookup_color(context: &gtk::StyleContext, name: &str, fallback: Srgba<f64>) -> Srgba<f64> {
        context
            .lookup_color(name)
            .map(|c| {
                Srgba::new(
                    c.red() as f64,
                    c.green() as f64,
                    c.blue() as f64,
                    c.alpha() as f64,
                )
            })
            .unwrap_or(fallback)
    }
}

pub fn load_css() {
    let provider = gtk::CssProvider::new();
    let css_data = "
.tonegrid-popup {
    background-color: rgba(0, 0, 0, 0.75);
    color: white;
    padding: 6px 12px;
    border-radius: 6px;
    font-size: 18px;
}
.tonegrid-prompt {
    font-weight: bold;
}
.tonegrid-correct {
    color: #2e7d32;
    font-size: 32px;
    font-weight: bold;
}
.tonegrid-incorrect {
    color: #c62828;
    font-size: 32px;
    font-weight: bold;
}
.tonegrid-error {
    color: #c62828;
}
";
    provider.load_from_data(css_data);

    if let Some(display) = gdk::Display::default() {
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
