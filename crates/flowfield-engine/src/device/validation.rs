/// Runs `f` inside a validation error scope.
///
/// Returns `f`'s value when the device raised nothing, otherwise the first
/// validation error. Objects created by a failing `f` are invalid and must be
/// discarded by the caller.
pub fn with_validation<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> Result<T, wgpu::Error> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    match pollster::block_on(scope.pop()) {
        Some(err) => Err(err),
        None => Ok(value),
    }
}
