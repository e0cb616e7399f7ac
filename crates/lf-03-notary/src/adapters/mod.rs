mod local;

pub use local::LocalNotaryClient;
