mod callbacks;
mod helpers;
