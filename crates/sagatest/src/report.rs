use sagaprobe_effect::{serialize_effect, Effect};

/// Render observed effects for a failure message: each effect indented by
/// two spaces, effects separated by a blank line. Empty input gives `""`.
pub fn report_actual_effects(effects: &[Effect]) -> String {
    effects
        .iter()
        .map(|effect| {
            serialize_effect(effect)
                .lines()
                .map(|line| format!("  {line}"))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
