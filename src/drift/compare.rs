use crate::instance::{Attribute, AttributeValue, Instance};
use crate::report::{AttributeDrift, Report};

/// Compares one instance ID across both sides, restricted to `attributes`.
///
/// `attributes` must already be resolved (non-empty, no duplicates).
pub fn compare_instance(
    instance_id: &str,
    live: Option<&Instance>,
    declared: Option<&Instance>,
    attributes: &[Attribute],
) -> Report {
    match (live, declared) {
        (Some(live), Some(declared)) => {
            let drifts = attributes
                .iter()
                .filter_map(|attr| {
                    let expected = declared.value(*attr);
                    let found = live.value(*attr);
                    (expected != found).then_some(AttributeDrift {
                        name: *attr,
                        expected,
                        found,
                    })
                })
                .collect();
            Report::compared(instance_id, drifts)
        }
        (Some(live), None) => Report::missing(
            instance_id,
            flag_all(attributes, |attr| (AttributeValue::Absent, live.value(attr))),
        ),
        (None, Some(declared)) => Report::missing(
            instance_id,
            flag_all(attributes, |attr| (declared.value(attr), AttributeValue::Absent)),
        ),
        (None, None) => Report::compared(instance_id, Vec::new()),
    }
}

fn flag_all(
    attributes: &[Attribute],
    values: impl Fn(Attribute) -> (AttributeValue, AttributeValue),
) -> Vec<AttributeDrift> {
    attributes
        .iter()
        .map(|attr| {
            let (expected, found) = values(*attr);
            AttributeDrift {
                name: *attr,
                expected,
                found,
            }
        })
        .collect()
}
