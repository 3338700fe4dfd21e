mod apod;

pub use apod::{Apod, ApodResponse, FavoriteApod, MediaType};
