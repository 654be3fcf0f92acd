//! Injection bootstrap: tear down any previous instance, then install fresh surfaces.

use pinpoint_core::DeviceProfile;

use crate::effect::Effect;
use crate::surface::Surface;

/// Remove every surface by its well-known id.
pub fn teardown() -> Vec<Effect> {
    Surface::ALL
        .iter()
        .map(|&surface| Effect::RemoveSurface { surface })
        .collect()
}

/// Full install sequence. Safe to run any number of times per page.
pub fn install(devices: &[DeviceProfile]) -> Vec<Effect> {
    let mut effects = teardown();
    effects.extend(Surface::ALL.iter().map(|&surface| Effect::CreateSurface {
        surface,
        z_index: surface.z_index(),
        visible: surface.visible_on_install(),
    }));
    effects.push(Effect::SetDevices {
        devices: devices.to_vec(),
    });
    effects.push(Effect::SetToggle { active: false });
    effects.push(Effect::SetListening { active: false });
    effects.push(Effect::ClearRecord);
    effects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_create_is_preceded_by_its_remove() {
        let effects = install(&DeviceProfile::catalog());
        for surface in Surface::ALL {
            let remove = effects
                .iter()
                .position(|e| *e == Effect::RemoveSurface { surface })
                .unwrap();
            let create = effects
                .iter()
                .position(|e| matches!(e, Effect::CreateSurface { surface: s, .. } if *s == surface))
                .unwrap();
            assert!(remove < create, "{:?} created before removal", surface);
        }
    }

    #[test]
    fn test_install_leaves_listeners_inert() {
        let effects = install(&[]);
        assert!(effects.contains(&Effect::SetListening { active: false }));
        assert!(effects.contains(&Effect::ClearRecord));
    }
}
