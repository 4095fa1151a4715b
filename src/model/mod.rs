// MODEL: settings declarations, live state and their query string form
pub mod settings;
pub mod query;

pub use settings::{
    DescriptorValue, Options, SettingDescriptor, SettingDescriptors, SettingValue, SettingsState,
};
