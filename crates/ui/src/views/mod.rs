mod complete;
mod home;
mod landing;
mod state;
mod take;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use complete::CompleteView;
pub use home::HomeView;
pub use landing::LandingView;
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use take::TestView;
