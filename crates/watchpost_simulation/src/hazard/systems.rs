//! Hazard systems: sync per-agent копий с HazardDirectory

use bevy::prelude::*;

use super::directory::HazardDirectory;
use super::escape::EscapeBehavior;

/// Система: новый агент получает полную копию реестра
///
/// Выполняется ДО broadcast - изменения этого тика применятся повторно
/// (insert/remove идемпотентны).
pub fn register_escape_agents(
    directory: Res<HazardDirectory>,
    mut agents: Query<(Entity, &mut EscapeBehavior), Added<EscapeBehavior>>,
) {
    for (entity, mut escape) in agents.iter_mut() {
        escape.register(&directory);
        crate::log(&format!(
            "🔥 {:?} registered for hazards ({} regions)",
            entity,
            escape.raw_len()
        ));
    }
}

/// Система: накопленные изменения реестра → каждому живому агенту
///
/// Despawned агенты просто выпадают из query (их merge worker отменяется
/// на drop).
pub fn broadcast_hazard_changes(mut directory: ResMut<HazardDirectory>, mut agents: Query<&mut EscapeBehavior>) {
    let changes = directory.take_changes();
    if changes.is_empty() {
        return;
    }

    for mut escape in agents.iter_mut() {
        for change in &changes {
            escape.apply_change(change);
        }
    }
}
