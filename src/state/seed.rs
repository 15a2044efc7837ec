//! Seed state embedded into freshly built images.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

use super::{State, VAULT_KEY};

const DEFAULT_USER: &str = "ramos";
const DEFAULT_HOST: &str = "ramos";

/// Secret sealed in the vault; only reachable by reading hidden state.
const VAULT_FLAG: &str = "RAMOS{F0und_3ven3_zr_st0nly_in_the_future}";

/// Both entries point the curious user at the vault.
const SEED_HISTORY: [&str; 2] = [
    "echo the vault lives under hidden keys",
    "echo base64 unlocks forgotten things",
];

const SEED_HINT_LEVEL: u64 = 1;

/// The canonical first-boot state. Identical on every call.
pub fn default_state() -> State {
    let mut state = State::new();
    state.set("user", DEFAULT_USER);
    state.set("host", DEFAULT_HOST);
    state.set(VAULT_KEY, BASE64_STANDARD.encode(VAULT_FLAG));
    for command in SEED_HISTORY {
        state.push_history(command);
    }
    state.hint_level = SEED_HINT_LEVEL;
    state
}
