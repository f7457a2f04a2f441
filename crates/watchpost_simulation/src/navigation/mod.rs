//! Navigation domain - Navigator + waypoint following
//!
//! Все sub-behaviors двигаются через `Navigator::advance`; raw waypoint
//! списки (patrol route) используют тот же `step_waypoint`.

pub mod navigator;
pub mod path;


pub use navigator::{
    NavigationMode, NavigationSettings, Navigator, DESTINATION_JUMP_THRESHOLD, FACING_COS_THRESHOLD,
};
pub use path::{step_waypoint, EndPathMode, PathCursor, PathState};
