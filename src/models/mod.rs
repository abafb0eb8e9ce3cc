pub mod playlist;
pub mod user;

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of the random part of generated ids.
const ID_LEN: usize = 16;

/// Generate an id such as `playlist-V1StGXR8Z5jdHi6B`.
pub fn new_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}", prefix, suffix)
}
