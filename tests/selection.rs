//! Drives the physical device rating pipeline on synthetic device data, the
//! way `find_most_suitable_gpu` does against a live instance.

use std::ffi::CString;
use std::os::raw::c_char;

use ash::vk;
use strix::init::physical::{
    rate_extension_support, rate_properties_support, rate_queue_support, tally_ratings,
    PhysicalDeviceType, SelectInfo,
};
use strix::version::SemanticVersion;

fn extension(name: &str) -> vk::ExtensionProperties {
    let mut props = vk::ExtensionProperties::default();
    for (dst, src) in props.extension_name.iter_mut().zip(name.bytes()) {
        *dst = src as c_char;
    }
    props
}

fn properties(api_version: u32, device_type: vk::PhysicalDeviceType) -> vk::PhysicalDeviceProperties {
    vk::PhysicalDeviceProperties {
        api_version,
        device_type,
        ..Default::default()
    }
}

fn queue_family(flags: vk::QueueFlags, count: u32) -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties {
        queue_flags: flags,
        queue_count: count,
        ..Default::default()
    }
}

#[test]
fn discrete_gpu_on_the_desired_api_version_scores_highest() {
    let info = SelectInfo {
        desired_version: SemanticVersion::new(1, 3, 0),
        ..Default::default()
    };

    let discrete = properties(
        vk::make_api_version(0, 1, 3, 0),
        vk::PhysicalDeviceType::DISCRETE_GPU,
    );
    let integrated = properties(
        vk::make_api_version(0, 1, 3, 0),
        vk::PhysicalDeviceType::INTEGRATED_GPU,
    );

    // Preferred type (1000) + desired api version (500), against
    // integrated (400) + desired api version (500).
    assert_eq!(rate_properties_support(&discrete, &info), 1500);
    assert_eq!(rate_properties_support(&integrated, &info), 900);
}

#[test]
fn device_below_the_minimum_version_is_rejected() {
    let info = SelectInfo {
        minimum_version: SemanticVersion::new(1, 2, 0),
        ..Default::default()
    };

    let old = properties(
        vk::make_api_version(0, 1, 1, 0),
        vk::PhysicalDeviceType::DISCRETE_GPU,
    );

    assert_eq!(rate_properties_support(&old, &info), -1);
}

#[test]
fn strict_type_preference_rejects_everything_else() {
    let info = SelectInfo {
        preferred_type: PhysicalDeviceType::Discrete,
        allow_any_device_type: false,
        ..Default::default()
    };

    let cpu = properties(
        vk::make_api_version(0, 1, 0, 0),
        vk::PhysicalDeviceType::CPU,
    );

    assert_eq!(rate_properties_support(&cpu, &info), -1);
}

#[test]
fn missing_required_extension_disqualifies_the_device() {
    let available = [extension("VK_KHR_swapchain")];
    let required = [CString::new("VK_KHR_swapchain").unwrap()];
    let missing = [CString::new("VK_KHR_ray_tracing_pipeline").unwrap()];

    let (enabled, rating) = rate_extension_support(&available, &required, &[]);
    assert_eq!(rating, 1);
    assert_eq!(enabled, required);

    let (enabled, rating) = rate_extension_support(&available, &missing, &[]);
    assert_eq!(rating, -1);
    assert!(enabled.is_empty());
}

#[test]
fn unsupported_desired_extensions_are_skipped_without_penalty() {
    let available = [extension("VK_KHR_swapchain"), extension("VK_EXT_mesh_shader")];
    let required = [CString::new("VK_KHR_swapchain").unwrap()];
    let desired = [
        CString::new("VK_EXT_mesh_shader").unwrap(),
        CString::new("VK_EXT_not_real").unwrap(),
    ];

    let (enabled, rating) = rate_extension_support(&available, &required, &desired);
    assert_eq!(rating, 2);
    assert_eq!(
        enabled,
        [
            CString::new("VK_KHR_swapchain").unwrap(),
            CString::new("VK_EXT_mesh_shader").unwrap(),
        ]
    );
}

#[test]
fn dedicated_queue_families_are_picked_for_auxiliary_work() {
    let families = [
        queue_family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
            16,
        ),
        queue_family(vk::QueueFlags::TRANSFER, 2),
        queue_family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, 8),
    ];

    let (selections, rating) = rate_queue_support(&families, true, true);

    // One general queue plus a dedicated transfer and a compute queue, each
    // worth 10.
    assert_eq!(rating, 20);
    assert_eq!(selections.len(), 3);
    assert!(selections
        .iter()
        .any(|s| s.flags == vk::QueueFlags::GRAPHICS));
    assert!(selections
        .iter()
        .any(|s| s.flags == vk::QueueFlags::TRANSFER && s.family == 1));
    assert!(selections
        .iter()
        .any(|s| s.flags == vk::QueueFlags::COMPUTE && s.family == 2));
}

#[test]
fn single_family_devices_share_it_across_roles() {
    let families = [queue_family(
        vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
        3,
    )];

    let (selections, rating) = rate_queue_support(&families, true, true);

    assert_eq!(rating, 20);
    let mut indices: Vec<u32> = selections.iter().map(|s| s.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, [0, 1, 2]);
}

#[test]
fn compute_only_device_cannot_serve_a_window() {
    let families = [queue_family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, 4)];

    let (selections, rating) = rate_queue_support(&families, false, false);
    assert_eq!(rating, -1);
    assert!(selections.is_empty());
}

#[test]
fn one_negative_part_sinks_the_whole_tally() {
    assert_eq!(tally_ratings(&[1500, 2, 20]), 1522);
    assert_eq!(tally_ratings(&[1500, -1, 20]), -1);
    assert_eq!(tally_ratings(&[]), 0);
}
