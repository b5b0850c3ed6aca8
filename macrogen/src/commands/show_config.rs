//! Show-config command - prints the resolved configuration and registry.

use super::SystemPipeline;

pub fn run(pipeline: &SystemPipeline) {
    println!("{}", pipeline.config());
    println!("Registry ({} instantiations)", pipeline.registry().len());
    for spec in pipeline.registry() {
        let kind: &str = spec.collection_kind.as_ref();
        println!(
            "    {:<14} {:<4} {}_{:<14} -> {}",
            spec.instance_name, spec.prefix, spec.library, kind, spec.template_header
        );
    }
}
