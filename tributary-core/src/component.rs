/// The core trait for defining components in Tributary.
///
/// A `Component` takes an input and produces an output.
/// Interpolants and the upstream input resolver are components, so an
/// integrator loop can call them uniformly.
///
/// ## Implementing `Component`
///
/// To define a `Component`, implement the [`call()`] method, which takes
/// an input and returns either an output or an error. Components should be
/// deterministic, always producing the same result for a given input.
///
/// [`call()`]: Component::call
pub trait Component {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Calls the component with the given input and returns a result.
    ///
    /// This is the only method required when implementing `Component`.
    ///
    /// # Errors
    ///
    /// Each component defines its own `Error` type, allowing it to determine
    /// what constitutes a failure within its domain.
    fn call(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    struct Hold {
        value: f64,
    }

    impl Component for Hold {
        type Input = f64;
        type Output = f64;
        type Error = Infallible;

        fn call(&self, _time: Self::Input) -> Result<Self::Output, Self::Error> {
            Ok(self.value)
        }
    }

    #[test]
    fn components_are_deterministic() {
        let hold = Hold { value: 3.5 };
        assert_eq!(hold.call(0.0).unwrap(), hold.call(100.0).unwrap());
    }
}
