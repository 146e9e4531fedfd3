use std::time::Instant;

use wgpu::util::DeviceExt as _;

use crate::{
    error::{VorosetError, VorosetResult},
    region::Region,
    render::{FrameRgba, KernelTiming, RenderOptions},
};

/// Fixed relative path the kernel source is read from at run time.
pub const KERNEL_SOURCE_PATH: &str = "shaders/voroset.wgsl";

/// Fixed entry point the compiled kernel must export.
pub const KERNEL_ENTRY_POINT: &str = "voroset";

const WORKGROUP_SIZE: u32 = 8;

/// Region count uniform, padded to 16 bytes for the uniform address space.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    num_regions: i32,
    _pad: [u32; 3],
}

/// A compiled kernel: compute pipeline plus the layout its three bindings
/// (region buffer, output surface, region count) are bound through.
#[derive(Debug)]
pub struct ComputeKernel {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

pub struct GpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    timestamps: bool,
}

/// Read the kernel source from [`KERNEL_SOURCE_PATH`].
pub fn load_kernel_source() -> VorosetResult<String> {
    std::fs::read_to_string(KERNEL_SOURCE_PATH).map_err(|e| {
        VorosetError::kernel(format!(
            "cannot read kernel source '{KERNEL_SOURCE_PATH}': {e}"
        ))
    })
}

impl GpuRenderer {
    pub fn new() -> VorosetResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| match e {
            wgpu::RequestAdapterError::NotFound { .. } => {
                VorosetError::gpu("no gpu adapter available")
            }
            other => VorosetError::gpu(format!("wgpu request_adapter failed: {other:?}")),
        })?;

        let timestamps = adapter.features().contains(wgpu::Features::TIMESTAMP_QUERY);
        let required_features = if timestamps {
            wgpu::Features::TIMESTAMP_QUERY
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features,
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            }))
            .map_err(|e| VorosetError::gpu(format!("wgpu request_device failed: {e:?}")))?;

        tracing::debug!(timestamps, "acquired gpu device and queue");

        Ok(Self {
            device,
            queue,
            timestamps,
        })
    }

    /// Compile WGSL kernel source into a compute pipeline with the fixed
    /// three-binding layout. Compilation errors surface as kernel errors
    /// instead of device panics.
    pub fn compile_kernel(&self, source: &str) -> VorosetResult<ComputeKernel> {
        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("voroset_kernel_bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: true },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::StorageTexture {
                                access: wgpu::StorageTextureAccess::WriteOnly,
                                format: wgpu::TextureFormat::Rgba8Unorm,
                                view_dimension: wgpu::TextureViewDimension::D2,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: wgpu::BufferSize::new(
                                    std::mem::size_of::<Params>() as u64,
                                ),
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline_layout =
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("voroset_kernel_pl"),
                    bind_group_layouts: &[&bind_group_layout],
                    push_constant_ranges: &[],
                });

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("voroset_kernel"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("voroset_kernel_pipeline"),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some(KERNEL_ENTRY_POINT),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(VorosetError::kernel(format!(
                "kernel compilation failed: {err}"
            )));
        }

        Ok(ComputeKernel {
            pipeline,
            bind_group_layout,
        })
    }

    /// Upload the regions, dispatch the kernel once over the full image,
    /// block until it finishes, and read the surface back into host memory.
    #[tracing::instrument(skip(self, kernel, regions), fields(regions = regions.len()))]
    pub fn render(
        &self,
        kernel: &ComputeKernel,
        regions: &[Region],
        opts: RenderOptions,
    ) -> VorosetResult<(FrameRgba, KernelTiming)> {
        opts.validate()?;

        let num_regions = i32::try_from(regions.len()).map_err(|_| {
            VorosetError::validation(format!(
                "region count {} exceeds the kernel's signed 32-bit contract",
                regions.len()
            ))
        })?;

        // wgpu rejects zero-sized bindings; an empty set uploads one zeroed
        // record while the bound count stays 0.
        let placeholder = [Region::new([0.0; 2], [0.0; 3])];
        let upload: &[Region] = if regions.is_empty() {
            &placeholder
        } else {
            regions
        };

        let region_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("voroset_regions"),
                contents: bytemuck::cast_slice(upload),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let params = Params {
            num_regions,
            _pad: [0; 3],
        };
        let params_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("voroset_params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let output = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("voroset_output"),
            size: wgpu::Extent3d {
                width: opts.width,
                height: opts.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let output_view = output.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("voroset_kernel_bg"),
            layout: &kernel.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: region_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let bytes_per_row_unpadded = opts
            .width
            .checked_mul(4)
            .ok_or_else(|| VorosetError::resource("output width overflow"))?;
        let bytes_per_row = align_to(bytes_per_row_unpadded, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let readback_size = (bytes_per_row as u64)
            .checked_mul(opts.height as u64)
            .ok_or_else(|| VorosetError::resource("readback buffer size overflow"))?;

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("voroset_readback"),
            size: readback_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let profiler = if self.timestamps {
            Some(self.create_profiler()?)
        } else {
            None
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("voroset_encoder"),
            });

        {
            let timestamp_writes =
                profiler
                    .as_ref()
                    .map(|p| wgpu::ComputePassTimestampWrites {
                        query_set: &p.query_set,
                        beginning_of_pass_write_index: Some(0),
                        end_of_pass_write_index: Some(1),
                    });
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("voroset_dispatch"),
                timestamp_writes,
            });
            pass.set_pipeline(&kernel.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(
                opts.width.div_ceil(WORKGROUP_SIZE),
                opts.height.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }

        if let Some(p) = &profiler {
            encoder.resolve_query_set(&p.query_set, 0..2, &p.resolve, 0);
            encoder.copy_buffer_to_buffer(&p.resolve, 0, &p.staging, 0, 16);
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &output,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(opts.height),
                },
            },
            wgpu::Extent3d {
                width: opts.width,
                height: opts.height,
                depth_or_array_layers: 1,
            },
        );

        let started = Instant::now();
        self.queue.submit(Some(encoder.finish()));

        self.map_buffer(&readback)?;
        if let Some(p) = &profiler {
            self.map_buffer(&p.staging)?;
        }
        let wall_seconds = started.elapsed().as_secs_f64();

        let timing = match &profiler {
            Some(p) => {
                let mapped = p.staging.slice(..).get_mapped_range();
                let stamps: [u64; 2] = [
                    u64::from_le_bytes(mapped[0..8].try_into().map_err(|_| {
                        VorosetError::resource("timestamp readback truncated")
                    })?),
                    u64::from_le_bytes(mapped[8..16].try_into().map_err(|_| {
                        VorosetError::resource("timestamp readback truncated")
                    })?),
                ];
                drop(mapped);
                p.staging.unmap();
                let ticks = stamps[1].saturating_sub(stamps[0]);
                let nanos = ticks as f64 * self.queue.get_timestamp_period() as f64;
                KernelTiming::Device(nanos * 1.0e-9)
            }
            None => KernelTiming::Wall(wall_seconds),
        };

        // Drop the row padding the copy alignment forced on us.
        let mapped = readback.slice(..).get_mapped_range();
        let row_bytes = (opts.width as usize) * 4;
        let padded_row_bytes = bytes_per_row as usize;
        let mut data = Vec::with_capacity(row_bytes * opts.height as usize);
        for row in 0..opts.height as usize {
            let start = row * padded_row_bytes;
            data.extend_from_slice(&mapped[start..start + row_bytes]);
        }
        drop(mapped);
        readback.unmap();

        Ok((
            FrameRgba {
                width: opts.width,
                height: opts.height,
                data,
            },
            timing,
        ))
    }

    fn create_profiler(&self) -> VorosetResult<Profiler> {
        let query_set = self.device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("voroset_timestamps"),
            ty: wgpu::QueryType::Timestamp,
            count: 2,
        });
        let resolve = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("voroset_timestamp_resolve"),
            size: 16,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("voroset_timestamp_staging"),
            size: 16,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(Profiler {
            query_set,
            resolve,
            staging,
        })
    }

    fn map_buffer(&self, buffer: &wgpu::Buffer) -> VorosetResult<()> {
        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| VorosetError::gpu(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| VorosetError::resource("readback channel closed"))?
            .map_err(|e| VorosetError::resource(format!("readback map failed: {e:?}")))?;
        Ok(())
    }
}

struct Profiler {
    query_set: wgpu::QuerySet,
    resolve: wgpu::Buffer,
    staging: wgpu::Buffer,
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_to_copy_alignment() {
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(4, 256), 256);
    }

    #[test]
    fn params_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<Params>(), 16);
    }

    // Test assertions on fallible kernel results need this bound.
    #[test]
    fn compute_kernel_is_debug() {
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_debug::<ComputeKernel>();
    }
}
