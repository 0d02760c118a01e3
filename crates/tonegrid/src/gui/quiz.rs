use gtk::prelude::*;
use gtk4 as gtk;
use sectors::learning::AnswerOption;
use sectors::{Modality, Verdict};

pub const SWATCH_SIZE: i32 = 40;

pub fn prompt_text(recall: Modality) -> &'static str {
    match recall {
        Modality::Color => "Which colour was that sector?",
        Modality::Coordinate => "Where was that sector?",
        Modality::Spatial => "Click the sector on the grid.",
        Modality::Piano => "",
    }
}

pub fn modality_label(modality: Modality) -> &'static str {
    match modality {
        Modality::Piano => "Tone",
        Modality::Color => "Colour",
        Modality::Spatial => "Position",
        Modality::Coordinate => "Coordinates",
    }
}

pub fn feedback_class(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Correct => "tonegrid-correct",
        Verdict::Incorrect => "tonegrid-incorrect",
    }
}

/// A button for one answer: a colour swatch for colour questions, the label otherwise.
pub fn option_button(option: &AnswerOption) -> gtk::Button {
    let button = gtk::Button::new();
    button.set_tooltip_text(Some(&option.label));

    match option.color {
        Some(color) => {
            let swatch = gtk::DrawingArea::new();
            swatch.set_content_width(SWATCH_SIZE);
            swatch.set_content_height(SWATCH_SIZE);
            swatch.set_draw_func(move |_, cr, w, h| {
                let (r, g, b) = color.to_rgb().into_components();
                cr.set_source_rgb(r, g, b);
                cr.rectangle(0.0, 0.0, w as f64, h as f64);
                if let Err(e) = cr.fill() {
                    log::error!("Drawing error: {}", e);
                }
            });
            button.set_child(Some(&swatch));
        }
        None => button.set_label(&option.label),
    }
    button
}
