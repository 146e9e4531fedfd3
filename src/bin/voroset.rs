use voroset::{
    GpuRenderer, KernelTiming, RenderOptions, VorosetResult, generate_regions,
    load_kernel_source, save_jpeg,
};

const IMAGE_WIDTH: u32 = 1024;
const IMAGE_HEIGHT: u32 = 1024;
const NUM_REGIONS: usize = 1_000_000;

const OUTPUT_PATH: &str = "voroset.jpg";

fn main() {
    if let Err(err) = run() {
        // One-line diagnostic on stdout, nonzero exit. All device handles
        // are released by drop before we get here.
        println!("{err}");
        std::process::exit(1);
    }
}

fn run() -> VorosetResult<()> {
    let regions = generate_regions(NUM_REGIONS);

    let renderer = GpuRenderer::new()?;
    let kernel = renderer.compile_kernel(&load_kernel_source()?)?;

    let opts = RenderOptions {
        width: IMAGE_WIDTH,
        height: IMAGE_HEIGHT,
    };
    let (frame, timing) = renderer.render(&kernel, &regions, opts)?;

    match timing {
        KernelTiming::Device(s) => {
            println!("Time taken (in seconds) to render the region set = {s}");
        }
        KernelTiming::Wall(s) => {
            println!("Time taken (in seconds, host clock) to render the region set = {s}");
        }
    }

    save_jpeg(&frame, OUTPUT_PATH)?;
    eprintln!("wrote {OUTPUT_PATH}");
    Ok(())
}
