use crate::config::{self, Settings};
use crate::events::{AppEvent, RemoteCommand};
use crate::gui::grid;
use crate::gui::quiz;
use crate::gui::theme::{self, ThemeColors};
use crate::gui::CANVAS_SIZE;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use sectors::learning::AnswerOption;
use sectors::{ClickOutcome, Modality, Point, SectorColor, Session, Verdict};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;

/// Added to every timer so it never fires before its deadline.
const TIMER_SLACK: Duration = Duration::from_millis(1);

pub struct AppModel {
    pub session: Rc<RefCell<Session>>,
    pub settings: Settings,
    pub show_colors: bool,
    pub passive: bool,
    pub learning: bool,
    pub settings_open: bool,
    pub note_text: String,
    pub popup: Option<String>,
    pub feedback: Option<Verdict>,
    pub prompt: Option<Modality>,
    pub backdrop: Option<SectorColor>,
    pub settings_error: Option<String>,
    pub learning_error: Option<String>,
    pub radial_input: String,
    pub circumferential_input: String,
    shown_options: Vec<AnswerOption>,
    armed: Option<Instant>,
    drawing_area: gtk::DrawingArea,
    options_box: gtk::Box,
    radial_entry: gtk::Entry,
    circumferential_entry: gtk::Entry,
    cue_checks: Vec<(Modality, gtk::CheckButton)>,
    recall_checks: Vec<(Modality, gtk::CheckButton)>,
}

#[derive(Debug)]
pub enum AppMsg {
    ToggleColors,
    TogglePassive,
    ToggleLearning,
    ToggleSettings,
    StopAll,
    Click(Point),
    Resize(i32, i32),
    Choose(usize),
    CueToggled(Modality, bool),
    RecallToggled(Modality, bool),
    RadialInput(String),
    CircumferentialInput(String),
    ApplySettings,
    Tick,
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Remote(RemoteCommand::Passive) => AppMsg::TogglePassive,
            AppEvent::Remote(RemoteCommand::Learn) => AppMsg::ToggleLearning,
            AppEvent::Remote(RemoteCommand::Colors) => AppMsg::ToggleColors,
            AppEvent::Remote(RemoteCommand::Stop) => AppMsg::StopAll,
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (Session, Settings, async_channel::Receiver<AppEvent>);
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("Tone Grid"),

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,
                set_spacing: 8,
                set_margin_top: 12,
                set_margin_bottom: 12,
                set_margin_start: 12,
                set_margin_end: 12,

                gtk::Box {
                    set_orientation: gtk::Orientation::Horizontal,
                    set_spacing: 6,
                    set_halign: gtk::Align::Center,

                    gtk::Button {
                        #[watch]
                        set_label: if model.show_colors { "Hide Colors" } else { "Show Colors" },
                        connect_clicked => AppMsg::ToggleColors,
                    },
                    gtk::Button {
                        #[watch]
                        set_label: if model.passive { "Stop Passive" } else { "Start Passive" },
                        connect_clicked => AppMsg::TogglePassive,
                    },
                    gtk::Button {
                        #[watch]
                        set_label: if model.learning { "Stop Learning" } else { "Start Learning" },
                        connect_clicked => AppMsg::ToggleLearning,
                    },
                    gtk::Button {
                        set_label: "Settings",
                        connect_clicked => AppMsg::ToggleSettings,
                    },
                },

                gtk::Box {
                    set_orientation: gtk::Orientation::Vertical,
                    set_spacing: 6,
                    #[watch]
                    set_visible: model.settings_open,

                    gtk::Box {
                        set_orientation: gtk::Orientation::Horizontal,
                        set_spacing: 6,

                        gtk::Label {
                            set_label: "Radial Divisions (1-8)",
                        },
                        #[name = "radial_entry"]
                        gtk::Entry {
                            set_text: &model.radial_input,
                            set_width_chars: 4,
                            connect_changed[sender] => move |entry| {
                                sender.input(AppMsg::RadialInput(entry.text().to_string()));
                            },
                        },
                        gtk::Label {
                            set_label: "Circumferential Divisions (1-20)",
                        },
                        #[name = "circumferential_entry"]
                        gtk::Entry {
                            set_text: &model.circumferential_input,
                            set_width_chars: 4,
                            connect_changed[sender] => move |entry| {
                                sender.input(AppMsg::CircumferentialInput(entry.text().to_string()));
                            },
                        },
                        gtk::Button {
                            set_label: "Apply",
                            connect_clicked => AppMsg::ApplySettings,
                        },
                    },

                    gtk::Label {
                        add_css_class: "tonegrid-error",
                        set_xalign: 0.0,
                        #[watch]
                        set_visible: model.settings_error.is_some(),
                        #[watch]
                        set_label: model.settings_error.as_deref().unwrap_or_default(),
                    },

                    gtk::Box {
                        set_orientation: gtk::Orientation::Horizontal,
                        set_spacing: 6,

                        gtk::Label {
                            set_label: "Cue with:",
                        },
                        #[name = "cue_box"]
                        gtk::Box {
                            set_orientation: gtk::Orientation::Horizontal,
                            set_spacing: 4,
                        },
                    },

                    gtk::Box {
                        set_orientation: gtk::Orientation::Horizontal,
                        set_spacing: 6,

                        gtk::Label {
                            set_label: "Recall with:",
                        },
                        #[name = "recall_box"]
                        gtk::Box {
                            set_orientation: gtk::Orientation::Horizontal,
                            set_spacing: 4,
                        },
                    },

                    gtk::Label {
                        add_css_class: "tonegrid-error",
                        set_xalign: 0.0,
                        #[watch]
                        set_visible: model.learning_error.is_some(),
                        #[watch]
                        set_label: model.learning_error.as_deref().unwrap_or_default(),
                    },
                },

                gtk::Overlay {
                    #[name = "drawing_area"]
                    gtk::DrawingArea {
                        set_content_width: CANVAS_SIZE,
                        set_content_height: CANVAS_SIZE,
                        set_hexpand: true,
                        set_vexpand: true,

                        connect_resize[sender] => move |_, width, height| {
                            sender.input(AppMsg::Resize(width, height));
                        },

                        add_controller = gtk::GestureClick {
                            connect_pressed[sender] => move |_, _, x, y| {
                                sender.input(AppMsg::Click(Point::new(x, y)));
                            }
                        }
                    },

                    add_overlay = &gtk::Label {
                        add_css_class: "tonegrid-popup",
                        set_halign: gtk::Align::Center,
                        set_valign: gtk::Align::Center,
                        set_can_target: false,
                        #[watch]
                        set_visible: model.popup.is_some(),
                        #[watch]
                        set_label: model.popup.as_deref().unwrap_or_default(),
                    },

                    add_overlay = &gtk::Label {
                        add_css_class: quiz::feedback_class(Verdict::Correct),
                        set_label: &Verdict::Correct.to_string(),
                        set_halign: gtk::Align::Center,
                        set_valign: gtk::Align::Start,
                        set_can_target: false,
                        #[watch]
                        set_visible: model.feedback == Some(Verdict::Correct),
                    },

                    add_overlay = &gtk::Label {
                        add_css_class: quiz::feedback_class(Verdict::Incorrect),
                        set_label: &Verdict::Incorrect.to_string(),
                        set_halign: gtk::Align::Center,
                        set_valign: gtk::Align::Start,
                        set_can_target: false,
                        #[watch]
                        set_visible: model.feedback == Some(Verdict::Incorrect),
                    },
                },

                gtk::Label {
                    #[watch]
                    set_label: &model.note_text,
                },

                gtk::Label {
                    add_css_class: "tonegrid-prompt",
                    #[watch]
                    set_visible: model.prompt.is_some(),
                    #[watch]
                    set_label: model.prompt.map(quiz::prompt_text).unwrap_or_default(),
                },

                #[name = "options_box"]
                gtk::Box {
                    set_orientation: gtk::Orientation::Horizontal,
                    set_spacing: 6,
                    set_halign: gtk::Align::Center,
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (session, settings, rx) = init;

        theme::load_css();

        let grid_config = session.layout().config();
        let model = AppModel {
            session: Rc::new(RefCell::new(session)),
            show_colors: settings.show_colors,
            passive: false,
            learning: false,
            settings_open: false,
            note_text: String::new(),
            popup: None,
            feedback: None,
            prompt: None,
            backdrop: None,
            settings_error: None,
            learning_error: None,
            radial_input: grid_config.radial_divisions().to_string(),
            circumferential_input: grid_config.circumferential_divisions().to_string(),
            settings,
            shown_options: Vec::new(),
            armed: None,
            drawing_area: gtk::DrawingArea::default(),
            options_box: gtk::Box::default(),
            radial_entry: gtk::Entry::default(),
            circumferential_entry: gtk::Entry::default(),
            cue_checks: Vec::new(),
            recall_checks: Vec::new(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();
        model.options_box = widgets.options_box.clone();
        model.radial_entry = widgets.radial_entry.clone();
        model.circumferential_entry = widgets.circumferential_entry.clone();

        for modality in Modality::iter() {
            let check = modality_check(modality, model.settings.learning.cues.contains(&modality));
            let sender = sender.clone();
            check.connect_toggled(move |c| {
                sender.input(AppMsg::CueToggled(modality, c.is_active()));
            });
            widgets.cue_box.append(&check);
            model.cue_checks.push((modality, check));
        }
        for modality in Modality::recallable() {
            let check =
                modality_check(modality, model.settings.learning.recalls.contains(&modality));
            let sender = sender.clone();
            check.connect_toggled(move |c| {
                sender.input(AppMsg::RecallToggled(modality, c.is_active()));
            });
            widgets.recall_box.append(&check);
            model.recall_checks.push((modality, check));
        }

        let session_draw = model.session.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, _, _| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                let session = session_draw.borrow();
                let backdrop = session.learning().view().background;
                if let Err(e) = grid::draw(cr, &session.scene(), &colors, backdrop) {
                    log::error!("Drawing error: {}", e);
                }
            });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        let now = Instant::now();

        match msg {
            AppMsg::ToggleColors => {
                let shown = self.session.borrow_mut().toggle_show_colors();
                self.settings.show_colors = shown;
                self.persist();
            }
            AppMsg::TogglePassive => {
                self.session.borrow_mut().toggle_passive(now);
            }
            AppMsg::ToggleLearning => {
                let mut session = self.session.borrow_mut();
                if !session.stop_learning() {
                    match session.start_learning(self.settings.learning.clone(), now) {
                        Ok(()) => self.learning_error = None,
                        Err(e) => {
                            log::warn!("Cannot start learning: {}", e);
                            self.learning_error = Some(e.to_string());
                            self.settings_open = true;
                        }
                    }
                }
            }
            AppMsg::ToggleSettings => {
                self.settings_open = !self.settings_open;
            }
            AppMsg::StopAll => {
                let mut session = self.session.borrow_mut();
                session.stop_passive();
                session.stop_learning();
            }
            AppMsg::Click(point) => match self.session.borrow_mut().click(point, now) {
                Some(ClickOutcome::Played(note)) => {
                    log::debug!("Played {} at {}", note.frequency, note.sector);
                }
                Some(ClickOutcome::Answered(verdict)) => {
                    log::debug!("Spatial answer {}", verdict);
                }
                None => {}
            },
            AppMsg::Resize(width, height) => {
                self.session
                    .borrow_mut()
                    .resize(width as f64, height as f64);
            }
            AppMsg::Choose(index) => {
                self.session.borrow_mut().choose_option(index, now);
            }
            AppMsg::CueToggled(modality, active) => {
                let cues = &mut self.settings.learning.cues;
                let changed = if active {
                    cues.insert(modality)
                } else {
                    cues.remove(&modality)
                };
                if changed {
                    self.learning_error = None;
                    self.persist();
                }
            }
            AppMsg::RecallToggled(modality, active) => {
                let recalls = &mut self.settings.learning.recalls;
                let changed = if active {
                    recalls.insert(modality)
                } else {
                    recalls.remove(&modality)
                };
                if changed {
                    self.learning_error = None;
                    self.persist();
                }
            }
            AppMsg::RadialInput(text) => self.radial_input = text,
            AppMsg::CircumferentialInput(text) => self.circumferential_input = text,
            AppMsg::ApplySettings => {
                match config::parse_grid_input(&self.radial_input, &self.circumferential_input) {
                    Ok(grid_config) => {
                        self.settings_error = None;
                        if grid_config != self.session.borrow().layout().config() {
                            self.session.borrow_mut().reconfigure(grid_config, now);
                            self.settings.set_grid(grid_config);
                            self.persist();
                        }
                    }
                    Err(e) => {
                        log::warn!("Rejected grid settings: {}", e);
                        self.settings_error = Some(e.to_string());
                    }
                }
            }
            AppMsg::Tick => {
                self.armed = None;
                self.session.borrow_mut().advance(now);
            }
            AppMsg::ConfigReload => match config::load_settings() {
                Ok(new_settings) => {
                    if new_settings != self.settings {
                        self.apply_settings(new_settings, now);
                        log::info!("Configuration reloaded");
                    }
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }

        self.sync(&sender);
        self.arm_timer(&sender);
    }
}

fn modality_check(modality: Modality, active: bool) -> gtk::CheckButton {
    let check = gtk::CheckButton::with_label(quiz::modality_label(modality));
    check.set_active(active);
    check
}

impl AppModel {
    fn persist(&self) {
        match config::save_settings(&self.settings) {
            Ok(path) => log::debug!("Settings saved to {}", path.display()),
            Err(e) => log::error!("Failed to save settings: {}", e),
        }
    }

    /// Pushes externally edited settings into the session and the settings widgets.
    fn apply_settings(&mut self, settings: Settings, now: Instant) {
        let grid_config = settings.grid();
        {
            let mut session = self.session.borrow_mut();
            if grid_config != session.layout().config() {
                session.reconfigure(grid_config, now);
            }
            session.set_show_colors(settings.show_colors);
        }

        self.radial_entry
            .set_text(&grid_config.radial_divisions().to_string());
        self.circumferential_entry
            .set_text(&grid_config.circumferential_divisions().to_string());
        for (modality, check) in &self.cue_checks {
            check.set_active(settings.learning.cues.contains(modality));
        }
        for (modality, check) in &self.recall_checks {
            check.set_active(settings.learning.recalls.contains(modality));
        }

        self.settings = settings;
        self.settings_error = None;
    }

    /// Copies session state into the watched fields and repaints when needed.
    fn sync(&mut self, sender: &ComponentSender<Self>) {
        let session = self.session.clone();
        let mut session = session.borrow_mut();

        self.show_colors = session.show_colors();
        self.passive = session.passive().is_active();
        self.learning = session.learning().is_active();
        if let Some(note) = session.last_note() {
            self.note_text = format!("Playing frequency: {}", note.frequency);
        }

        let view = session.learning().view();
        self.popup = view.popup.clone();
        self.feedback = view.feedback;
        self.prompt = view.prompt;

        let backdrop_changed = view.background != self.backdrop;
        self.backdrop = view.background;

        if view.options != self.shown_options {
            self.shown_options = view.options.clone();
            self.rebuild_options(sender);
        }

        if session.take_redraw() || backdrop_changed {
            self.drawing_area.queue_draw();
        }
    }

    fn rebuild_options(&self, sender: &ComponentSender<Self>) {
        while let Some(child) = self.options_box.first_child() {
            self.options_box.remove(&child);
        }
        for (index, option) in self.shown_options.iter().enumerate() {
            let button = quiz::option_button(option);
            let sender = sender.clone();
            button.connect_clicked(move |_| sender.input(AppMsg::Choose(index)));
            self.options_box.append(&button);
        }
    }

    fn arm_timer(&mut self, sender: &ComponentSender<Self>) {
        let Some(deadline) = self.session.borrow().next_deadline() else {
            return;
        };
        if self.armed.is_some_and(|armed| armed <= deadline) {
            return;
        }

        self.armed = Some(deadline);
        let delay = deadline.saturating_duration_since(Instant::now()) + TIMER_SLACK;
        let sender = sender.clone();
        glib::timeout_add_local_once(delay, move || sender.input(AppMsg::Tick));
    }
}
