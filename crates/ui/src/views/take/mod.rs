mod integrity;
mod scripts;
mod view;

pub use view::TestView;
