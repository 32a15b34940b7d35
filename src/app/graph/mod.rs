mod build;
mod interaction;
pub(super) mod scene;
mod view;
