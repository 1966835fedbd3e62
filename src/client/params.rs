/// HTTP verb of a render-ws call together with its JSON body, if any.
#[derive(Debug)]
pub(crate) enum Action<Body> {
    Get,
    Put(Body),
    Delete,
}

impl Action<()> {
    pub(crate) const GET: Self = Self::Get;
    #[cfg_attr(not(feature = "pointmatch"), allow(dead_code))]
    pub(crate) const DELETE: Self = Self::Delete;
}

impl<Body> Action<Body> {
    pub(crate) const fn method(&self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Put(_) => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}
