use crate::runtime::runtime;

extern "C" fn bdsim_init() {
    runtime().initialize();
}

extern "C" fn bdsim_fini() {
    runtime().finalize();
}

#[used]
#[unsafe(link_section = ".init_array")]
static INIT_ARRAY: extern "C" fn() = bdsim_init;

#[used]
#[unsafe(link_section = ".fini_array")]
static FINI_ARRAY: extern "C" fn() = bdsim_fini;
