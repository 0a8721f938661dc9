use std::borrow::Cow;

/// A typed cache key: the key template plus the type stored under it.
pub trait CacheKey {
    type Value;
    type Args<'r>;

    fn get_key_with_args(&self, args: Self::Args<'_>) -> Cow<'static, str>;

    fn get_key(&self) -> Cow<'static, str>
    where
        for<'r> Self::Args<'r>: CacheKeyAutoConstruct,
    {
        CacheKey::get_key_with_args(self, CacheKeyAutoConstruct::construct())
    }
}

pub trait CacheKeyAutoConstruct {
    fn construct() -> Self;
}

impl CacheKeyAutoConstruct for () {
    fn construct() -> Self {}
}
