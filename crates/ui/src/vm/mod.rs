mod landing_vm;
mod test_vm;
mod time_fmt;

pub use landing_vm::{LandingVm, RegistrationForm, TEST_RULES};
pub use test_vm::{
    BarTone, DotState, MAX_PROGRESS_DOTS, OptionVm, TestScreenVm, Urgency, map_test_screen,
};
pub use time_fmt::{format_clock, format_seconds};
