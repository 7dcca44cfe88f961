//! Facial expression and body animation selection.
//!
//! The expression is always the persona's `default` entry; the animation
//! is a uniform draw from the persona's animation repertoire. Choosing an
//! expression from the reply's content (e.g. `sad` for apologies) would
//! hook in here.

use crate::persona::{Expression, Persona};
use rand::Rng;
use rand::seq::SliceRandom;

/// Animation used when a persona has an empty repertoire.
pub const FALLBACK_ANIMATION: &str = "Idle";

/// Expression and animation picked for one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionChoice {
    /// Facial expression label.
    pub expression: Expression,
    /// Body animation clip name.
    pub animation: &'static str,
}

/// Pick an expression and animation for `persona` using `rng`.
pub fn select<R: Rng + ?Sized>(persona: &Persona, rng: &mut R) -> ExpressionChoice {
    let animation = persona
        .animations
        .choose(rng)
        .copied()
        .unwrap_or(FALLBACK_ANIMATION);
    ExpressionChoice {
        expression: Expression::Default,
        animation,
    }
}

/// Pick using the thread-local RNG.
pub fn select_random(persona: &Persona) -> ExpressionChoice {
    select(persona, &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::persona::PersonaId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn expression_is_always_default() {
        let mut rng = StdRng::seed_from_u64(7);
        for id in PersonaId::ALL {
            for _ in 0..20 {
                assert_eq!(select(id.persona(), &mut rng).expression, Expression::Default);
            }
        }
    }

    #[test]
    fn animation_comes_from_repertoire() {
        let mut rng = StdRng::seed_from_u64(11);
        let persona = PersonaId::Rex.persona();
        for _ in 0..50 {
            let choice = select(persona, &mut rng);
            assert!(persona.animations.contains(&choice.animation));
        }
    }

    #[test]
    fn draws_cover_the_repertoire() {
        let mut rng = StdRng::seed_from_u64(3);
        let persona = PersonaId::Teacher.persona();
        let seen: HashSet<_> = (0..500).map(|_| select(persona, &mut rng).animation).collect();
        assert_eq!(seen.len(), persona.animations.len());
    }

    #[test]
    fn empty_repertoire_falls_back_to_idle() {
        let persona = Persona {
            id: PersonaId::Default,
            name: "Blank",
            system_prompt: "",
            voice_id: "v",
            expressions: &[],
            animations: &[],
        };
        let choice = select_random(&persona);
        assert_eq!(choice.animation, FALLBACK_ANIMATION);
        assert_eq!(choice.expression, Expression::Default);
    }

    #[test]
    fn unknown_persona_uses_default_repertoire() {
        let persona = PersonaId::resolve(Some("Mystery Tutor")).persona();
        let choice = select_random(persona);
        assert!(PersonaId::Default.persona().animations.contains(&choice.animation));
    }
}
