use serde::{Deserialize, Serialize};

/// Mutable state of the room for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneState {
    pub lamp_on: bool,
    pub tv_on: bool,
    /// Always within `1..=TV_CHANNELS`.
    pub tv_channel: u8,
    pub computer_on: bool,
    pub is_pointer_locked: bool,
    pub is_using_computer: bool,
    pub is_sitting: bool,
    pub cat_pet_count: u32,
}

pub const TV_CHANNELS: u8 = 5;

impl Default for SceneState {
    fn default() -> Self {
        Self {
            lamp_on: false,
            tv_on: false,
            tv_channel: 1,
            computer_on: false,
            is_pointer_locked: false,
            is_using_computer: false,
            is_sitting: false,
            cat_pet_count: 0,
        }
    }
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Movement and mouse look only apply while the pointer is captured and the
    /// desktop terminal is closed.
    pub fn accepts_look(&self) -> bool {
        self.is_pointer_locked && !self.is_using_computer
    }

    pub fn accepts_movement(&self) -> bool {
        self.accepts_look() && !self.is_sitting
    }

    pub fn next_tv_channel(&self) -> u8 {
        self.tv_channel % TV_CHANNELS + 1
    }
}

/// Closed set of things the player can click on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Lamp,
    Tv,
    Computer,
    Cat,
    Sofa,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::Lamp,
        ObjectKind::Tv,
        ObjectKind::Computer,
        ObjectKind::Cat,
        ObjectKind::Sofa,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Lamp => "lamp",
            Self::Tv => "tv",
            Self::Computer => "computer",
            Self::Cat => "cat",
            Self::Sofa => "sofa",
        }
    }
}

/// Marks a scene object as a click target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactive {
    pub kind: ObjectKind,
    pub label: String,
}
