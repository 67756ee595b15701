//! Programs built into the interpreter.

/// Reads input until it runs out, then prints it reversed followed by a NUL.
pub const REVERSER: &str = "+[>,+]+[<-.]";

/// Prints a Sierpinski triangle on an 80-column display. By NYYRIKKI, 2002.
pub const SIERPINSKI: &str = "[ThisprogramprintsSierpinskitriangleon80-columndisplay.]>++++[<++++++++>-]>++++++++[>++++<-]>>++>>>+>>>+<<<<<<<<<<[-[->+<]>[-<+>>>.<<]>>>[[->++++++++[>++++<-]>.<<[->+<]+>[->++++++++++<<+>]>.[-]>]]+<<<[-[->+<]+>[-<+>>>-[->+<]++>[-<->]<<<]<<<<]++++++++++.+++.[-]<]+++++*****Made*By:*NYYRIKKI*2002*****";
