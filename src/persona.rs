//! Tutor personas.
//!
//! Each persona bundles the system prompt that steers the language model,
//! the speech synthesis voice, and the facial-expression and animation
//! repertoire the avatar renderer understands.
//!
//! Personas are compiled into the binary and never mutated. Lookup goes
//! through [`PersonaId`]; the human-readable name is a display attribute
//! only. Unknown names resolve to [`PersonaId::Default`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output rules appended to every persona prompt.
///
/// `{max_words}` is replaced with the configured word cap.
pub const SPEECH_DIRECTIVE: &str = "\
Your reply will be spoken aloud by an animated avatar.\n\
Do not use markdown, bullet points, headings, code blocks, or emojis.\n\
Write plain conversational sentences that are easy to say.\n\
Be concise: never exceed {max_words} words.";

/// Facial expression labels shared by every persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    /// Neutral resting face.
    Default,
    /// Smiling.
    Happy,
    /// Downturned mouth and brows.
    Sad,
    /// Raised brows, open mouth.
    Surprised,
    /// Furrowed brows.
    Angry,
}

impl Expression {
    /// All expression labels in repertoire order.
    pub const ALL: [Expression; 5] = [
        Expression::Default,
        Expression::Happy,
        Expression::Sad,
        Expression::Surprised,
        Expression::Angry,
    ];

    /// Wire label (`"default"`, `"happy"`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Expression::Default => "default",
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Surprised => "surprised",
            Expression::Angry => "angry",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifier of a built-in persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaId {
    /// Generic academy guide, used when the requested persona is unknown.
    Default,
    /// Creative Aria: arts, music and storytelling.
    Aria,
    /// Rex the Explorer: science and nature.
    Rex,
    /// Logic Leo: maths and puzzles.
    Leo,
    /// Teacher: patient general-purpose tutor.
    Teacher,
}

impl PersonaId {
    /// Every built-in persona.
    pub const ALL: [PersonaId; 5] = [
        PersonaId::Default,
        PersonaId::Aria,
        PersonaId::Rex,
        PersonaId::Leo,
        PersonaId::Teacher,
    ];

    /// Stable lowercase identifier.
    pub fn slug(self) -> &'static str {
        match self {
            PersonaId::Default => "default",
            PersonaId::Aria => "aria",
            PersonaId::Rex => "rex",
            PersonaId::Leo => "leo",
            PersonaId::Teacher => "teacher",
        }
    }

    /// Look a persona up by slug or display name, ignoring case and
    /// `-`/`_` separators. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = normalize_name(name);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|id| {
            let persona = id.persona();
            wanted == id.slug() || wanted == normalize_name(persona.name)
        })
    }

    /// Resolve an optional requested name, falling back to [`PersonaId::Default`].
    pub fn resolve(name: Option<&str>) -> Self {
        match name {
            None => PersonaId::Default,
            Some(name) => Self::from_name(name).unwrap_or_else(|| {
                tracing::debug!(requested = name, "unknown persona, using default");
                PersonaId::Default
            }),
        }
    }

    /// The static persona record for this id.
    pub fn persona(self) -> &'static Persona {
        match self {
            PersonaId::Default => &DEFAULT,
            PersonaId::Aria => &ARIA,
            PersonaId::Rex => &REX,
            PersonaId::Leo => &LEO,
            PersonaId::Teacher => &TEACHER,
        }
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PersonaId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown persona: {s}"))
    }
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A tutor character configuration.
#[derive(Debug)]
pub struct Persona {
    /// Which persona this is.
    pub id: PersonaId,
    /// Display name shown in the UI.
    pub name: &'static str,
    /// Character prompt for the language model.
    pub system_prompt: &'static str,
    /// Speech synthesis voice identifier.
    pub voice_id: &'static str,
    /// Expression label → renderer blend-shape preset name.
    pub expressions: &'static [(Expression, &'static str)],
    /// Body animation clip names, in repertoire order.
    pub animations: &'static [&'static str],
}

impl Persona {
    /// Blend-shape preset for an expression, if the persona defines it.
    pub fn preset(&self, expression: Expression) -> Option<&'static str> {
        self.expressions
            .iter()
            .find(|(e, _)| *e == expression)
            .map(|(_, preset)| *preset)
    }

    /// Full system prompt: character prompt followed by the speech directive.
    pub fn assemble_prompt(&self, max_words: usize) -> String {
        let directive = SPEECH_DIRECTIVE.replace("{max_words}", &max_words.to_string());
        format!("{}\n\n{directive}", self.system_prompt.trim())
    }
}

const STANDARD_EXPRESSIONS: [(Expression, &str); 5] = [
    (Expression::Default, "default"),
    (Expression::Happy, "smile"),
    (Expression::Sad, "sad"),
    (Expression::Surprised, "surprised"),
    (Expression::Angry, "angry"),
];

// Rex's rig names its brow presets differently.
const REX_EXPRESSIONS: [(Expression, &str); 5] = [
    (Expression::Default, "default"),
    (Expression::Happy, "grin"),
    (Expression::Sad, "frown"),
    (Expression::Surprised, "wow"),
    (Expression::Angry, "scowl"),
];

static DEFAULT: Persona = Persona {
    id: PersonaId::Default,
    name: "Academy Guide",
    system_prompt: "\
You are a friendly guide at the Academy of Talents, a school where children \
learn with animated tutors. Answer questions warmly and simply, and suggest \
which tutor could help when a question needs a specialist.",
    voice_id: "21m00Tcm4TlvDq8ikWAM",
    expressions: &STANDARD_EXPRESSIONS,
    animations: &["Idle", "Talking_0", "Talking_1"],
};

static ARIA: Persona = Persona {
    id: PersonaId::Aria,
    name: "Creative Aria",
    system_prompt: "\
You are Creative Aria, an imaginative arts tutor. You help children draw, \
write stories, and explore music. Encourage every idea, ask playful \
follow-up questions, and use vivid but simple imagery.",
    voice_id: "EXAVITQu4vr4xnVV3yDU",
    expressions: &STANDARD_EXPRESSIONS,
    animations: &["Talking_0", "Talking_1", "Talking_2", "Laughing"],
};

static REX: Persona = Persona {
    id: PersonaId::Rex,
    name: "Rex the Explorer",
    system_prompt: "\
You are Rex the Explorer, an adventurous science tutor. You explain nature, \
space, and how things work through little expeditions and experiments \
children can try safely at home.",
    voice_id: "ErXwobaYiN019PkySvjV",
    expressions: &REX_EXPRESSIONS,
    animations: &["Talking_0", "Talking_2", "Pointing", "Rumba"],
};

static LEO: Persona = Persona {
    id: PersonaId::Leo,
    name: "Logic Leo",
    system_prompt: "\
You are Logic Leo, a calm maths and puzzles tutor. Break problems into small \
steps, check understanding before moving on, and never just give away the \
answer when a hint will do.",
    voice_id: "pNInz6obpgDQGcFmaJgB",
    expressions: &STANDARD_EXPRESSIONS,
    animations: &["Talking_0", "Talking_1", "Thinking"],
};

static TEACHER: Persona = Persona {
    id: PersonaId::Teacher,
    name: "Teacher",
    system_prompt: "\
You are a patient teacher at the Academy of Talents. Explain any school \
subject clearly, use everyday examples, and praise effort.",
    voice_id: "TxGEqnHWrfWFTfGW9XjX",
    expressions: &STANDARD_EXPRESSIONS,
    animations: &["Talking_0", "Talking_1", "Talking_2", "Idle"],
};
