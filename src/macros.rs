/// Builds a [`Controller`](crate::Controller) from a list of bindings.
///
/// ```
/// use nuclear_dispatch::{controller, Controller, Kind, StatusCode};
///
/// let v1: Controller = controller! { "v1";
///     GET "/info" => |ctx| Box::pin(async move {
///         ctx.send_text("v1", StatusCode::OK);
///         Ok(())
///     })
/// };
///
/// let api: Controller = controller! { "api";
///     ANY "/" => |ctx| Box::pin(async move { Err(Kind::Unhandled.into()) }),
///     @ "/v1" => v1,
///     FAIL "/*" [Kind::InvalidArgument] => |ctx| Box::pin(async move {
///         ctx.send_status(StatusCode::BAD_REQUEST);
///         Ok(())
///     }),
///     FAIL "/*" => |ctx| Box::pin(async move {
///         let status = ctx.failure_status();
///         ctx.send_status(status);
///         Ok(())
///     })
/// };
/// assert_eq!(api.name(), "api");
/// ```
#[macro_export]
macro_rules! controller {
    {@entry $c:expr, @, $prefix:literal, [], $sub:expr} => {
        $c.mount($prefix, $sub)
    };
    {@entry $c:expr, ANY, $pattern:literal, [], $handler:expr} => {
        $c.endpoint($pattern, $handler)
    };
    {@entry $c:expr, FAIL, $pattern:literal, [$($kind:expr),*], $handler:expr} => {
        $c.register_failure($pattern, &[$($kind),*], $handler)
    };
    {@entry $c:expr, GET, $pattern:literal, [], $handler:expr} => {
        $c.register($pattern, &[$crate::Method::GET], $handler)
    };
    {@entry $c:expr, POST, $pattern:literal, [], $handler:expr} => {
        $c.register($pattern, &[$crate::Method::POST], $handler)
    };
    {@entry $c:expr, PUT, $pattern:literal, [], $handler:expr} => {
        $c.register($pattern, &[$crate::Method::PUT], $handler)
    };
    {@entry $c:expr, DELETE, $pattern:literal, [], $handler:expr} => {
        $c.register($pattern, &[$crate::Method::DELETE], $handler)
    };
    {@entry $c:expr, HEAD, $pattern:literal, [], $handler:expr} => {
        $c.register($pattern, &[$crate::Method::HEAD], $handler)
    };
    {@entry $c:expr, OPTIONS, $pattern:literal, [], $handler:expr} => {
        $c.register($pattern, &[$crate::Method::OPTIONS], $handler)
    };
    {@entry $c:expr, PATCH, $pattern:literal, [], $handler:expr} => {
        $c.register($pattern, &[$crate::Method::PATCH], $handler)
    };

    {$name:expr; $($method:tt $pattern:literal $([$($kind:expr),* $(,)?])? => $handler:expr),+ $(,)?} => {{
        let mut __controller = $crate::Controller::with_kinds($name);
        $($crate::controller!(@entry __controller, $method, $pattern, [$($($kind),*)?], $handler);)+
        __controller
    }};
}
