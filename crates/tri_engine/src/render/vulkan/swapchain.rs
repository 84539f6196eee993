//! Swapchain negotiation and management
//!
//! A `SurfaceSupport` snapshot captures what the driver reports for one
//! device/surface pair; the `choose_*` functions resolve a concrete
//! presentation configuration from it with fixed preference rules; and
//! `Swapchain` owns the resulting image chain and its per-image views.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Instance};

use crate::render::vulkan::context::{VulkanError, VulkanResult};
use crate::render::vulkan::device::PhysicalDeviceInfo;

/// Snapshot of a surface's capabilities for one device
///
/// Queried fresh per device/surface pair and never cached across either
/// changing.
pub struct SurfaceSupport {
    /// Image count and extent bounds
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported format/colorspace pairs, in enumeration order
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported presentation modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupport {
    /// Query the surface capabilities of one device/surface pair
    pub fn query(
        surface_loader: &Surface,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Self> {
        let capabilities = unsafe {
            surface_loader
                .get_physical_device_surface_capabilities(device, surface)
                .map_err(VulkanError::Api)?
        };
        let formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(device, surface)
                .map_err(VulkanError::Api)?
        };
        let present_modes = unsafe {
            surface_loader
                .get_physical_device_surface_present_modes(device, surface)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// Whether a swapchain can be built from this snapshot at all
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Prefer 8-bit BGRA sRGB with a non-linear sRGB color space, falling back
/// to the first supported format in enumeration order
///
/// Returns `None` when the surface reports no formats at all; such a
/// surface cannot host a swapchain.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|sf| {
            sf.format == vk::Format::B8G8R8A8_SRGB
                && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
}

/// Prefer low-latency MAILBOX, falling back to the always-available FIFO
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    modes
        .iter()
        .copied()
        .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Resolve the swapchain extent
///
/// When `current_extent` carries the all-bits-set sentinel the surface lets
/// the application pick, so the framebuffer size is clamped per dimension
/// into the reported bounds; otherwise the surface dictates the extent.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    framebuffer_extent: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: framebuffer_extent.width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: framebuffer_extent.height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// One above the minimum, clamped to the maximum when it is finite
///
/// `max_image_count == 0` means the surface imposes no upper bound.
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let mut count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count = count.min(capabilities.max_image_count);
    }
    count
}

/// Swapchain and per-image views with RAII cleanup
pub struct Swapchain {
    device: Device,
    swapchain_loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Negotiate a presentation configuration and build the image chain
    pub fn new(
        instance: &Instance,
        device: Device,
        surface: vk::SurfaceKHR,
        support: &SurfaceSupport,
        physical_device_info: &PhysicalDeviceInfo,
        framebuffer_extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        if !support.is_adequate() {
            return Err(VulkanError::UnsupportedSurface);
        }

        let swapchain_loader = SwapchainLoader::new(instance, &device);

        let format =
            choose_surface_format(&support.formats).ok_or(VulkanError::UnsupportedSurface)?;
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(&support.capabilities, framebuffer_extent);
        let image_count = choose_image_count(&support.capabilities);

        log::info!(
            "Swapchain: format {:?}/{:?}, mode {:?}, extent {}x{}, {} images",
            format.format,
            format.color_space,
            present_mode,
            extent.width,
            extent.height,
            image_count
        );

        let queue_family_indices = [
            physical_device_info.graphics_family,
            physical_device_info.present_family,
        ];

        let mut create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        // Split graphics/present families need concurrent image access
        create_info = if physical_device_info.graphics_family
            != physical_device_info.present_family
        {
            create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&queue_family_indices)
        } else {
            create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        };

        let swapchain = unsafe {
            swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(VulkanError::SwapchainCreation)?
        };

        let images = unsafe {
            swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(VulkanError::SwapchainCreation)?
        };

        let image_views: Result<Vec<_>, _> = images
            .iter()
            .map(|&image| {
                let create_info = vk::ImageViewCreateInfo::builder()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(format.format)
                    .components(vk::ComponentMapping {
                        r: vk::ComponentSwizzle::IDENTITY,
                        g: vk::ComponentSwizzle::IDENTITY,
                        b: vk::ComponentSwizzle::IDENTITY,
                        a: vk::ComponentSwizzle::IDENTITY,
                    })
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });

                unsafe { device.create_image_view(&create_info, None) }
            })
            .collect();

        let image_views = image_views.map_err(VulkanError::SwapchainCreation)?;

        Ok(Self {
            device,
            swapchain_loader,
            swapchain,
            images,
            image_views,
            format,
            extent,
        })
    }

    /// Get swapchain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Get surface format
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    /// Get image views
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Get swapchain handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Get swapchain loader
    pub fn loader(&self) -> &SwapchainLoader {
        &self.swapchain_loader
    }

    /// Number of images in the chain
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &image_view in &self.image_views {
                self.device.destroy_image_view(image_view, None);
            }

            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn capabilities(min_count: u32, max_count: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min_count,
            max_image_count: max_count,
            ..Default::default()
        }
    }

    /// The preferred sRGB BGRA / non-linear pair is selected when present,
    /// regardless of order
    #[test]
    fn prefers_srgb_bgra_nonlinear() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    /// Without the preferred pair, the first entry wins (order-preserving
    /// fallback)
    #[test]
    fn falls_back_to_first_format() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    }

    /// An empty format set yields no configuration instead of panicking
    #[test]
    fn empty_format_set_yields_none() {
        assert!(choose_surface_format(&[]).is_none());
    }

    /// The preferred format must match on both format and color space
    #[test]
    fn srgb_format_with_wrong_colorspace_not_preferred() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
        ];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    }

    /// MAILBOX is preferred when available; FIFO otherwise
    #[test]
    fn present_mode_two_tier_preference() {
        let with_mailbox = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(choose_present_mode(&with_mailbox), vk::PresentModeKHR::MAILBOX);

        let without_mailbox = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&without_mailbox), vk::PresentModeKHR::FIFO);

        // FIFO is the guaranteed fallback even when not listed first
        let only_immediate = [vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&only_immediate), vk::PresentModeKHR::FIFO);
    }

    /// A fixed current extent is used verbatim
    #[test]
    fn fixed_extent_used_verbatim() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1024,
                height: 768,
            },
            ..Default::default()
        };
        let extent = choose_extent(
            &caps,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        );
        assert_eq!(extent.width, 1024);
        assert_eq!(extent.height, 768);
    }

    /// The sentinel extent derives from the framebuffer size, clamped per
    /// dimension
    #[test]
    fn sentinel_extent_clamps_framebuffer_size() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 320,
                height: 240,
            },
            max_image_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            ..Default::default()
        };

        // Width below the minimum, height above the maximum
        let extent = choose_extent(
            &caps,
            vk::Extent2D {
                width: 100,
                height: 4000,
            },
        );
        assert_eq!(extent.width, 320);
        assert_eq!(extent.height, 1080);

        // In-range sizes pass through
        let extent = choose_extent(
            &caps,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        );
        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);
    }

    /// Image count is min+1, clamped down by a finite maximum
    #[test]
    fn image_count_min_plus_one_clamped() {
        assert_eq!(choose_image_count(&capabilities(2, 0)), 3);
        assert_eq!(choose_image_count(&capabilities(2, 8)), 3);
        assert_eq!(choose_image_count(&capabilities(2, 2)), 2);
        assert_eq!(choose_image_count(&capabilities(4, 4)), 4);
    }

    /// Scenario from the negotiation contract: {other, sRGB-BGRA} formats
    /// and {FIFO} modes resolve to the sRGB pair and FIFO
    #[test]
    fn negotiation_scenario_srgb_and_fifo() {
        let formats = [
            format(vk::Format::R5G6B5_UNORM_PACK16, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let modes = [vk::PresentModeKHR::FIFO];

        assert_eq!(
            choose_surface_format(&formats).unwrap().format,
            vk::Format::B8G8R8A8_SRGB
        );
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    /// Adequacy requires at least one format and one present mode
    #[test]
    fn adequacy_requires_formats_and_modes() {
        let support = SurfaceSupport {
            capabilities: Default::default(),
            formats: vec![format(
                vk::Format::B8G8R8A8_SRGB,
                vk::ColorSpaceKHR::SRGB_NONLINEAR,
            )],
            present_modes: vec![],
        };
        assert!(!support.is_adequate());

        let support = SurfaceSupport {
            capabilities: Default::default(),
            formats: vec![],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(!support.is_adequate());
    }
}
