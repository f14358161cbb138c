//! The dispatch header (`samples.h`).
//!
//! One conditional-include chain selects the table header matching the build
//! flag platformio defined, so every user environment compiles from the same
//! firmware source. Factory environments are compiled in unconditionally by
//! the firmware itself and never appear here.

/// Render the dispatch header for `user_envs`, in order.
///
/// First listed wins if several symbols are somehow defined at once. An empty
/// list yields just the closing `#endif`, which preprocesses to nothing.
pub fn generate(user_envs: &[String]) -> String {
    let mut lines = Vec::with_capacity(user_envs.len() * 2 + 1);
    for (i, env) in user_envs.iter().enumerate() {
        if i == 0 {
            lines.push(format!("#ifdef {}", env.to_uppercase()));
        } else {
            lines.push(format!("#elif defined({})", env.to_uppercase()));
        }
        lines.push(format!("#include \"samples_{}.h\"", env.to_lowercase()));
    }
    lines.push("#endif".to_string());
    lines.join("\n")
}
