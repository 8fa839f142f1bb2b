fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Vendored protoc so builds need no system protobuf install.
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    prost_build::compile_protos(
        &["proto/gtfs-realtime.proto"], // input proto
        &["proto/"],                    // proto include path
    )?;
    Ok(())
}
