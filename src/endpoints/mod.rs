pub mod index_resource;
pub mod movie_resource;
pub mod recommend_resource;
