pub mod category;
pub mod movie;
pub mod movie_credit;
pub mod movie_view;
pub mod nomination;
pub mod person;
pub mod users;
