//! Error types for the particle pipeline.
//!
//! Resource failures from the graphics context are returned as values.
//! Contract violations (mismatched buffer sizes, sampling an unpublished
//! layer, ticking before initialization) panic instead.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors surfaced by texture, render target, and program allocation.
#[derive(Debug)]
pub enum FboError {
    /// The graphics context ran out of memory while allocating a resource.
    OutOfMemory(String),
    /// The graphics context rejected a resource or pipeline description.
    Validation(String),
    /// An offscreen draw was issued with no render target bound.
    NoRenderTarget,
    /// GPU initialization failed.
    Gpu(GpuError),
}

impl fmt::Display for FboError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FboError::OutOfMemory(what) => write!(f, "Out of GPU memory while creating {}", what),
            FboError::Validation(msg) => write!(f, "GPU validation error: {}", msg),
            FboError::NoRenderTarget => write!(f, "Offscreen render issued with no render target bound"),
            FboError::Gpu(e) => write!(f, "GPU error: {}", e),
        }
    }
}

impl std::error::Error for FboError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FboError::Gpu(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GpuError> for FboError {
    fn from(e: GpuError) -> Self {
        FboError::Gpu(e)
    }
}

impl From<wgpu::Error> for FboError {
    fn from(e: wgpu::Error) -> Self {
        match e {
            wgpu::Error::OutOfMemory { .. } => FboError::OutOfMemory(e.to_string()),
            other => FboError::Validation(other.to_string()),
        }
    }
}

/// Errors that can occur when running the windowed application.
#[derive(Debug)]
pub enum AppError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// Pipeline setup or frame rendering failed.
    Fbo(FboError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            AppError::Window(e) => write!(f, "Failed to create window: {}", e),
            AppError::Fbo(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Fbo(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for AppError {
    fn from(e: winit::error::OsError) -> Self {
        AppError::Window(e)
    }
}

impl From<FboError> for AppError {
    fn from(e: FboError) -> Self {
        AppError::Fbo(e)
    }
}

impl From<GpuError> for AppError {
    fn from(e: GpuError) -> Self {
        AppError::Fbo(FboError::Gpu(e))
    }
}
