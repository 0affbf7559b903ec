//! This crate provides the [Pass] abstraction used to assemble the linNet
//! analysis pipeline.
//!
//! A [Pass] consumes an input and either produces an output or fails with an
//! error. Passes compose with [Pass::chain], feeding the output of one stage
//! into the next; the resulting [Chain] is itself a [Pass], so whole
//! pipelines can be built up and run with a single call.

/// A single transformation stage in a pipeline.
pub trait Pass {
    type Input<'a>;
    type Output<'a>;
    type Error;

    /// Runs this pass on the given input.
    fn run<'a>(&mut self, input: Self::Input<'a>) -> Result<Self::Output<'a>, Self::Error>;

    /// Chains two passes together, such that the output of this pass is fed
    /// to `next` as its input.
    fn chain<P>(self, next: P) -> Chain<Self, P>
    where
        Self: Sized,
        P: for<'a> Pass<Input<'a> = Self::Output<'a>>,
        Self::Error: Into<<P as Pass>::Error>,
    {
        Chain::new(self, next)
    }
}

/// [Chain] represents the composition of two [Pass] implementations.
pub struct Chain<A, B> {
    a: A,
    b: B,
}
impl<A, B> Chain<A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self { a, b }
    }
}
impl<A, B> Pass for Chain<A, B>
where
    A: Pass,
    B: for<'a> Pass<Input<'a> = <A as Pass>::Output<'a>>,
    <A as Pass>::Error: Into<<B as Pass>::Error>,
{
    type Input<'a> = <A as Pass>::Input<'a>;
    type Output<'a> = <B as Pass>::Output<'a>;
    type Error = <B as Pass>::Error;

    fn run<'a>(&mut self, input: Self::Input<'a>) -> Result<Self::Output<'a>, Self::Error> {
        let output = self.a.run(input).map_err(Into::into)?;
        self.b.run(output)
    }
}
