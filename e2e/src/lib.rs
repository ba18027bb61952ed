#[cfg(test)]
mod execution;
#[cfg(test)]
mod http;
#[cfg(test)]
mod probes;
#[cfg(test)]
mod startup;
#[cfg(test)]
mod testkit;
