use super::{NamedTensorCache, ParameterError, ParameterStore};

/// Moves every declared parameter out of the cache, in declared order, and
/// drops whatever the cache still holds afterwards.
pub fn materialize<A>(
    declared_order: &[String],
    cache: &mut NamedTensorCache<A>,
) -> Result<ParameterStore<A>, ParameterError> {
    if let Some(missing) =
        declared_order.iter().find(|name| !cache.contains(name))
    {
        return Err(ParameterError::MissingParameter(missing.clone()));
    }

    let tensors = declared_order
        .iter()
        .map(|name| {
            cache
                .take(name)
                .ok_or_else(|| ParameterError::MissingParameter(name.clone()))
        })
        .collect::<Result<Box<[A]>, _>>()?;
    cache.clear();

    Ok(ParameterStore::new(declared_order.into(), tensors))
}
