use crate::error::DiagError;
use crate::fixtures::FixtureStore;
use router_lab_abstract::DeviceSnapshot;

/// Effective view of `device` under `scenario`.
///
/// Interface overrides merge field by field into interfaces the device already
/// has; overrides for unknown interfaces are dropped. A scenario ACL set
/// replaces the device ACLs as a whole. An unknown scenario yields the base
/// snapshot. The stored base is never modified.
pub fn compose(
    fixtures: &FixtureStore,
    device: &str,
    scenario: &str,
) -> Result<DeviceSnapshot, DiagError> {
    let mut view = fixtures.snapshot(device)?.clone();
    let Ok(overlay) = fixtures.scenario(scenario) else {
        return Ok(view);
    };

    for (name, delta) in &overlay.interfaces {
        if let Some(iface) = view.interfaces.get_mut(name) {
            delta.apply_to(iface);
        }
    }
    if let Some(acls) = &overlay.acls {
        view.acls = acls.clone();
    }
    Ok(view)
}
