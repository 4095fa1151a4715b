use egui::Context;

use crate::model::settings::{format_hex_color, parse_hex_color};
use crate::model::{Options, SettingDescriptor, SettingDescriptors, SettingValue, SettingsState};

/// Logical width of the settings overlay
pub const PANEL_WIDTH: f32 = 280.0;
const ROW_HEIGHT: f32 = 26.0;
const CHROME_HEIGHT: f32 = 44.0;

/// What the user did to the panel during one frame
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PanelOutput {
    /// Settings edited in place this frame
    pub changed: Vec<String>,
    pub reset: bool,
}

/// Logical size the overlay needs for `rows` settings
pub fn panel_size(rows: usize, show_reset: bool) -> (f32, f32) {
    let rows = rows + usize::from(show_reset);
    (PANEL_WIDTH, CHROME_HEIGHT + rows as f32 * ROW_HEIGHT)
}

/// Build the settings window, editing `state` in place
pub fn build_settings_panel(
    ctx: &Context,
    descriptors: &SettingDescriptors,
    state: &mut SettingsState,
    show_reset: bool,
) -> PanelOutput {
    let mut output = PanelOutput::default();

    egui::Window::new("Settings")
        .default_pos([0.0, 0.0])
        .default_width(PANEL_WIDTH - 16.0)
        .resizable(false)
        .show(ctx, |ui| {
            for (name, descriptor) in descriptors.iter() {
                let Some(value) = state.get_mut(name) else {
                    continue;
                };
                let changed = ui
                    .add_enabled_ui(descriptor.editable, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new(name.as_str()).small());
                            setting_control(ui, name, descriptor, value)
                        })
                        .inner
                    })
                    .inner;
                if changed {
                    output.changed.push(name.clone());
                }
            }

            if show_reset {
                ui.separator();
                if ui.button("reset").clicked() {
                    output.reset = true;
                }
            }
        });

    output
}

fn setting_control(
    ui: &mut egui::Ui,
    name: &str,
    descriptor: &SettingDescriptor,
    value: &mut SettingValue,
) -> bool {
    if let Some(options) = descriptor.options() {
        return options_control(ui, name, options, value);
    }
    if descriptor.color {
        return color_control(ui, value);
    }
    match value {
        SettingValue::Number(n) => number_control(ui, descriptor, n),
        SettingValue::Bool(b) => ui.checkbox(b, "").changed(),
        SettingValue::Text(s) => ui.text_edit_singleline(s).changed(),
    }
}

fn number_control(ui: &mut egui::Ui, descriptor: &SettingDescriptor, n: &mut f64) -> bool {
    match (descriptor.min, descriptor.max) {
        (Some(min), Some(max)) => {
            let mut slider = egui::Slider::new(n, min..=max);
            if let Some(step) = descriptor.step {
                slider = slider.step_by(step);
            }
            ui.add(slider).changed()
        }
        (min, max) => {
            let range = min.unwrap_or(f64::NEG_INFINITY)..=max.unwrap_or(f64::INFINITY);
            let drag = egui::DragValue::new(n)
                .range(range)
                .speed(descriptor.step.unwrap_or(0.1));
            ui.add(drag).changed()
        }
    }
}

fn color_control(ui: &mut egui::Ui, value: &mut SettingValue) -> bool {
    let Some(mut rgb) = value.as_str().and_then(parse_hex_color) else {
        return false;
    };
    if ui.color_edit_button_srgb(&mut rgb).changed() {
        *value = SettingValue::Text(format_hex_color(rgb));
        true
    } else {
        false
    }
}

fn options_control(ui: &mut egui::Ui, name: &str, options: &Options, value: &mut SettingValue) -> bool {
    let before = value.clone();
    let entries = options.entries();

    egui::ComboBox::from_id_salt(name)
        .selected_text(selected_label(options, value))
        .show_ui(ui, |ui| {
            for (label, option) in &entries {
                ui.selectable_value(&mut *value, (*option).clone(), label.as_str());
            }
        });

    *value != before
}

/// Label shown for the current value of an option setting
pub fn selected_label(options: &Options, value: &SettingValue) -> String {
    options
        .entries()
        .into_iter()
        .find(|(_, option)| *option == value)
        .map(|(label, _)| label)
        .unwrap_or_else(|| value.to_string())
}
