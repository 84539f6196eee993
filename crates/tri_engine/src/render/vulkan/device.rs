//! Physical device selection
//!
//! Enumerates candidate devices, scores each from a capability snapshot, and
//! picks the best scoring candidate. Scoring and queue-family resolution are
//! pure functions over driver-reported data so they can be exercised without
//! a GPU.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::vk;
use ash::Instance;
use std::ffi::CStr;

use crate::render::vulkan::context::{VulkanError, VulkanResult};
use crate::render::vulkan::swapchain::SurfaceSupport;

/// Extensions a device must support to be viable
pub fn required_device_extensions() -> [&'static CStr; 1] {
    [SwapchainLoader::name()]
}

/// Optional graphics/present queue family indices for one device
///
/// Complete only when both indices are resolved; both are stable for the
/// lifetime of the logical device built from them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// First family exposing graphics-capable queues
    pub graphics: Option<u32>,
    /// First family reporting presentation support to the target surface
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// Scan queue families in index order, resolving graphics and present
    /// independently
    ///
    /// The two indices may coincide; scanning stops once both are resolved.
    /// `present_support` reports whether a given family index can present to
    /// the target surface.
    pub fn find<F>(
        families: &[vk::QueueFamilyProperties],
        mut present_support: F,
    ) -> VulkanResult<Self>
    where
        F: FnMut(u32) -> VulkanResult<bool>,
    {
        let mut indices = Self::default();

        for (index, family) in families.iter().enumerate() {
            let index = index as u32;

            if indices.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
            {
                indices.graphics = Some(index);
            }

            if indices.present.is_none() && present_support(index)? {
                indices.present = Some(index);
            }

            if indices.is_complete() {
                break;
            }
        }

        Ok(indices)
    }

    /// Whether both indices have been resolved
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }
}

/// Driver-reported capabilities of one candidate, flattened for scoring
#[derive(Debug, Clone, Copy)]
pub struct DeviceProfile {
    /// Reported device type (discrete, integrated, ...)
    pub device_type: vk::PhysicalDeviceType,
    /// Maximum 2D image dimension, used as a capability tie-breaker
    pub max_image_dimension_2d: u32,
    /// Whether the geometry-shader feature is available
    pub supports_geometry_shader: bool,
    /// Whether both graphics and present queue families were resolved
    pub queue_families_complete: bool,
    /// Whether all required device extensions are present
    pub has_required_extensions: bool,
    /// Whether the surface reports at least one format and one present mode
    pub surface_support_adequate: bool,
}

/// Score a candidate; 0 means unviable
///
/// Geometry-shader support is a hard requirement. Discrete GPUs, complete
/// queue families, and usable swapchain support each earn a fixed bonus; the
/// maximum 2D image dimension breaks ties between otherwise equal devices.
/// A device whose extensions are present but whose surface reports no
/// formats or no present modes cannot present at all and scores 0.
pub fn suitability_score(profile: &DeviceProfile) -> u32 {
    if !profile.supports_geometry_shader {
        return 0;
    }

    let mut score = 0;
    if profile.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
        score += 1000;
    }
    if profile.queue_families_complete {
        score += 1000;
    }
    if profile.has_required_extensions {
        if !profile.surface_support_adequate {
            return 0;
        }
        score += 1000;
    }

    score + profile.max_image_dimension_2d
}

/// Index of the highest nonzero score, first wins on ties
///
/// Returns `None` when every score is 0 (no viable candidate). Tie-breaking
/// by enumeration order is accepted nondeterminism under true ties.
pub fn select_best_index(scores: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score > 0 && best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

/// Selected physical device and the data later stages need from it
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Supported device features
    pub features: vk::PhysicalDeviceFeatures,
    /// Index of the graphics queue family
    pub graphics_family: u32,
    /// Index of the presentation queue family
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Select the highest-scoring viable device for the surface
    ///
    /// Ties are broken by enumeration order (first wins). Fails with
    /// `NoViableDevice` when every candidate scores 0.
    pub fn select(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(VulkanError::Api)?
        };

        let mut candidates = Vec::with_capacity(devices.len());
        let mut scores = Vec::with_capacity(devices.len());

        for device in devices {
            let (profile, indices) =
                Self::evaluate_device(instance, device, surface, surface_loader)?;
            let score = suitability_score(&profile);

            let properties = unsafe { instance.get_physical_device_properties(device) };
            let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) };
            log::debug!("Candidate {:?} scored {}", name.to_string_lossy(), score);

            candidates.push((device, indices));
            scores.push(score);
        }

        let best = select_best_index(&scores).ok_or(VulkanError::NoViableDevice)?;
        let (device, indices) = candidates[best];
        let score = scores[best];

        // A winner with unresolved indices cannot build a logical device
        let (graphics_family, present_family) = match (indices.graphics, indices.present) {
            (Some(g), Some(p)) => (g, p),
            _ => return Err(VulkanError::IncompleteQueueFamilies),
        };

        let properties = unsafe { instance.get_physical_device_properties(device) };
        let features = unsafe { instance.get_physical_device_features(device) };
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) };
        log::info!(
            "Selected GPU: {} (score {})",
            name.to_string_lossy(),
            score
        );

        Ok(Self {
            device,
            properties,
            features,
            graphics_family,
            present_family,
        })
    }

    /// Query one candidate's capabilities into a scoring profile
    fn evaluate_device(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<(DeviceProfile, QueueFamilyIndices)> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let features = unsafe { instance.get_physical_device_features(device) };
        let families = unsafe { instance.get_physical_device_queue_family_properties(device) };

        let indices = QueueFamilyIndices::find(&families, |index| unsafe {
            surface_loader
                .get_physical_device_surface_support(device, index, surface)
                .map_err(VulkanError::Api)
        })?;

        let has_required_extensions = Self::check_device_extensions(instance, device)?;

        // Swapchain support can only be probed when the extension exists
        let surface_support_adequate = if has_required_extensions {
            let support = SurfaceSupport::query(surface_loader, device, surface)?;
            support.is_adequate()
        } else {
            false
        };

        let profile = DeviceProfile {
            device_type: properties.device_type,
            max_image_dimension_2d: properties.limits.max_image_dimension2_d,
            supports_geometry_shader: features.geometry_shader == vk::TRUE,
            queue_families_complete: indices.is_complete(),
            has_required_extensions,
            surface_support_adequate,
        };

        Ok((profile, indices))
    }

    /// Whether the device supports every required extension
    fn check_device_extensions(
        instance: &Instance,
        device: vk::PhysicalDevice,
    ) -> VulkanResult<bool> {
        let available = unsafe {
            instance
                .enumerate_device_extension_properties(device)
                .map_err(VulkanError::Api)?
        };

        Ok(required_device_extensions().iter().all(|required| {
            available.iter().any(|props| {
                let name = unsafe { CStr::from_ptr(props.extension_name.as_ptr()) };
                name == *required
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn viable_profile() -> DeviceProfile {
        DeviceProfile {
            device_type: vk::PhysicalDeviceType::INTEGRATED_GPU,
            max_image_dimension_2d: 4096,
            supports_geometry_shader: true,
            queue_families_complete: true,
            has_required_extensions: true,
            surface_support_adequate: true,
        }
    }

    /// The maximal score wins; all-zero means no viable candidate
    #[test]
    fn best_index_picks_strict_maximum() {
        assert_eq!(select_best_index(&[100, 3000, 2000]), Some(1));
        assert_eq!(select_best_index(&[0, 0, 0]), None);
        assert_eq!(select_best_index(&[]), None);
        // Zero scores never win even when they are the only entries before
        // a viable one
        assert_eq!(select_best_index(&[0, 0, 5]), Some(2));
    }

    /// Exact ties resolve to the first candidate in enumeration order
    #[test]
    fn best_index_ties_break_by_enumeration_order() {
        assert_eq!(select_best_index(&[2000, 2000, 2000]), Some(0));
        assert_eq!(select_best_index(&[1000, 2000, 2000]), Some(1));
    }

    /// Missing geometry-shader support is disqualifying regardless of
    /// everything else
    #[test]
    fn no_geometry_shader_scores_zero() {
        let profile = DeviceProfile {
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            supports_geometry_shader: false,
            ..viable_profile()
        };
        assert_eq!(suitability_score(&profile), 0);
    }

    /// A fully capable discrete GPU earns all three bonuses plus the
    /// dimension tie-breaker
    #[test]
    fn discrete_gpu_scores_all_bonuses() {
        let profile = DeviceProfile {
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            max_image_dimension_2d: 16384,
            ..viable_profile()
        };
        assert_eq!(suitability_score(&profile), 3000 + 16384);
    }

    /// Extensions present but an empty format/present-mode set forces the
    /// score to 0 even for a discrete GPU
    #[test]
    fn inadequate_surface_support_forces_zero() {
        let profile = DeviceProfile {
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            surface_support_adequate: false,
            ..viable_profile()
        };
        assert_eq!(suitability_score(&profile), 0);
    }

    /// An integrated GPU with complete support beats a discrete GPU that is
    /// missing the required extensions
    #[test]
    fn integrated_beats_partial_discrete() {
        let integrated = viable_profile();
        let discrete_without_extensions = DeviceProfile {
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            has_required_extensions: false,
            surface_support_adequate: false,
            max_image_dimension_2d: 16384,
            ..viable_profile()
        };
        // integrated: 1000 (queues) + 1000 (extensions+surface) + 4096
        // discrete:   1000 (type) + 1000 (queues) + 16384, no extension bonus
        assert_eq!(suitability_score(&integrated), 2000 + 4096);
        assert_eq!(suitability_score(&discrete_without_extensions), 2000 + 16384);
        // With these dimensions the discrete card still wins on the
        // tie-breaker; shrink its texture limit and the integrated one wins.
        let weaker_discrete = DeviceProfile {
            max_image_dimension_2d: 2048,
            ..discrete_without_extensions
        };
        assert!(suitability_score(&integrated) > suitability_score(&weaker_discrete));
    }

    /// First graphics family and first present family are picked
    /// independently and may coincide
    #[test]
    fn resolves_shared_graphics_and_present_family() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER)];
        let indices = QueueFamilyIndices::find(&families, |_| Ok(true)).unwrap();
        assert_eq!(indices.graphics, Some(0));
        assert_eq!(indices.present, Some(0));
        assert!(indices.is_complete());
    }

    /// Graphics and present support on different families resolve to a
    /// split pair
    #[test]
    fn resolves_split_families() {
        let families = [
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        // Only the compute-only family can present
        let indices = QueueFamilyIndices::find(&families, |index| Ok(index == 0)).unwrap();
        assert_eq!(indices.graphics, Some(1));
        assert_eq!(indices.present, Some(0));
        assert!(indices.is_complete());
    }

    /// No present support anywhere leaves the pair incomplete
    #[test]
    fn missing_present_support_is_incomplete() {
        let families = [family(vk::QueueFlags::GRAPHICS)];
        let indices = QueueFamilyIndices::find(&families, |_| Ok(false)).unwrap();
        assert_eq!(indices.graphics, Some(0));
        assert_eq!(indices.present, None);
        assert!(!indices.is_complete());
    }

    /// No graphics-capable family anywhere leaves the pair incomplete
    #[test]
    fn missing_graphics_support_is_incomplete() {
        let families = [family(vk::QueueFlags::COMPUTE), family(vk::QueueFlags::TRANSFER)];
        let indices = QueueFamilyIndices::find(&families, |_| Ok(true)).unwrap();
        assert_eq!(indices.graphics, None);
        assert_eq!(indices.present, Some(0));
        assert!(!indices.is_complete());
    }

    /// Present-support probe errors propagate out of the scan
    #[test]
    fn present_probe_errors_propagate() {
        let families = [family(vk::QueueFlags::GRAPHICS)];
        let result = QueueFamilyIndices::find(&families, |_| {
            Err(VulkanError::Api(vk::Result::ERROR_SURFACE_LOST_KHR))
        });
        assert!(result.is_err());
    }
}
