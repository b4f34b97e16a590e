pub mod signup_board;
