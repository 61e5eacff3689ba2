mod build;
mod filter;
mod interaction;
mod view;
